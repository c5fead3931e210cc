//! Event slots and the receiver trait used for bulk binding.
//!
//! Every [`Event`] has exactly one slot. Registering a handler replaces the
//! previous one, [`Parser::unbind_all`](crate::parser::Parser::unbind_all)
//! empties every slot.

use std::fmt;

use crate::codec::UriPart;
use crate::parser::Parser;
use crate::protocol::CallbackResult;

/// The events a [`Parser`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    MessageBegin,
    HeaderField,
    HeaderValue,
    HeadersComplete,
    Body,
    MessageComplete,
    /// A callback failed, the handler receives the chunk being fed.
    Error,
    /// Request parsers only.
    Path,
    /// Request parsers only.
    QueryString,
    /// Request parsers only.
    Fragment,
    /// Request parsers only, the target without its fragment.
    Uri,
}

const EVENT_COUNT: usize = 11;

impl Event {
    /// The events every parser reports.
    pub const CORE: [Event; 7] = [
        Event::MessageBegin,
        Event::HeaderField,
        Event::HeaderValue,
        Event::HeadersComplete,
        Event::Body,
        Event::MessageComplete,
        Event::Error,
    ];

    /// The request target events of request parsers.
    pub const REQUEST_URI: [Event; 4] = [Event::Path, Event::QueryString, Event::Fragment, Event::Uri];

    /// Whether handlers of this event receive bytes.
    pub fn carries_data(self) -> bool {
        !matches!(self, Event::MessageBegin | Event::HeadersComplete | Event::MessageComplete)
    }

    pub fn name(self) -> &'static str {
        match self {
            Event::MessageBegin => "message_begin",
            Event::HeaderField => "header_field",
            Event::HeaderValue => "header_value",
            Event::HeadersComplete => "headers_complete",
            Event::Body => "body",
            Event::MessageComplete => "message_complete",
            Event::Error => "error",
            Event::Path => "path",
            Event::QueryString => "query_string",
            Event::Fragment => "fragment",
            Event::Uri => "uri",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl From<UriPart> for Event {
    fn from(part: UriPart) -> Self {
        match part {
            UriPart::Path => Event::Path,
            UriPart::QueryString => Event::QueryString,
            UriPart::Fragment => Event::Fragment,
            UriPart::Uri => Event::Uri,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A handler for events without data.
pub type NotifyHandler = Box<dyn FnMut(&mut Parser) -> CallbackResult>;

/// A handler for events carrying bytes.
pub type DataHandler = Box<dyn FnMut(&mut Parser, &[u8]) -> CallbackResult>;

pub(crate) enum Handler {
    Notify(NotifyHandler),
    Data(DataHandler),
}

impl Handler {
    pub(crate) fn call(&mut self, parser: &mut Parser, data: &[u8]) -> CallbackResult {
        match self {
            Handler::Notify(handler) => handler(parser),
            Handler::Data(handler) => handler(parser, data),
        }
    }
}

/// One slot per event.
///
/// Each slot carries a version that changes whenever the slot is written or
/// cleared. A handler is taken out of its slot while it runs and put back only
/// if the version is unchanged, so a handler that unbinds or replaces itself
/// stays unbound or replaced.
pub(crate) struct Callbacks {
    slots: [Option<Handler>; EVENT_COUNT],
    versions: [u64; EVENT_COUNT],
}

impl Callbacks {
    pub(crate) fn new() -> Self {
        Self { slots: std::array::from_fn(|_| None), versions: [0; EVENT_COUNT] }
    }

    pub(crate) fn set(&mut self, event: Event, handler: Handler) {
        self.slots[event.index()] = Some(handler);
        self.versions[event.index()] += 1;
    }

    pub(crate) fn unset(&mut self, event: Event) {
        self.slots[event.index()] = None;
        self.versions[event.index()] += 1;
    }

    pub(crate) fn clear(&mut self) {
        for event in Event::CORE.into_iter().chain(Event::REQUEST_URI) {
            self.unset(event);
        }
    }

    pub(crate) fn is_bound(&self, event: Event) -> bool {
        self.slots[event.index()].is_some()
    }

    pub(crate) fn take(&mut self, event: Event) -> Option<(Handler, u64)> {
        let index = event.index();
        self.slots[index].take().map(|handler| (handler, self.versions[index]))
    }

    pub(crate) fn restore(&mut self, event: Event, handler: Handler, version: u64) {
        let index = event.index();
        if self.versions[index] == version && self.slots[index].is_none() {
            self.slots[index] = Some(handler);
        }
    }

    pub(crate) fn bound(&self) -> impl Iterator<Item = Event> + '_ {
        Event::CORE.into_iter().chain(Event::REQUEST_URI).filter(|event| self.is_bound(*event))
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.bound()).finish()
    }
}

/// An object that can be bound to every event of a parser at once with
/// [`Parser::bind_to`](crate::parser::Parser::bind_to).
///
/// Only the events for which [`handles`](EventReceiver::handles) answers
/// `true` are bound. The other methods default to doing nothing.
#[allow(unused_variables, reason = "default handlers ignore their arguments")]
pub trait EventReceiver {
    /// Whether this receiver wants `event`.
    fn handles(&self, event: Event) -> bool;

    fn on_message_begin(&mut self, parser: &mut Parser) -> CallbackResult {
        Ok(())
    }

    fn on_header_field(&mut self, parser: &mut Parser, data: &[u8]) -> CallbackResult {
        Ok(())
    }

    fn on_header_value(&mut self, parser: &mut Parser, data: &[u8]) -> CallbackResult {
        Ok(())
    }

    fn on_headers_complete(&mut self, parser: &mut Parser) -> CallbackResult {
        Ok(())
    }

    fn on_body(&mut self, parser: &mut Parser, data: &[u8]) -> CallbackResult {
        Ok(())
    }

    fn on_message_complete(&mut self, parser: &mut Parser) -> CallbackResult {
        Ok(())
    }

    /// Receives the whole chunk that was being fed when a callback failed.
    fn on_error(&mut self, parser: &mut Parser, data: &[u8]) -> CallbackResult {
        Ok(())
    }

    fn on_path(&mut self, parser: &mut Parser, data: &[u8]) -> CallbackResult {
        Ok(())
    }

    fn on_query_string(&mut self, parser: &mut Parser, data: &[u8]) -> CallbackResult {
        Ok(())
    }

    fn on_fragment(&mut self, parser: &mut Parser, data: &[u8]) -> CallbackResult {
        Ok(())
    }

    fn on_uri(&mut self, parser: &mut Parser, data: &[u8]) -> CallbackResult {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Handler::Notify(Box::new(|_| Ok(())))
    }

    #[test]
    fn data_events() {
        assert!(!Event::MessageBegin.carries_data());
        assert!(Event::HeaderField.carries_data());
        assert!(Event::Error.carries_data());
        assert!(Event::Uri.carries_data());
        assert_eq!(Event::from(UriPart::QueryString), Event::QueryString);
        assert_eq!(Event::HeadersComplete.to_string(), "headers_complete");
    }

    #[test]
    fn restore_respects_changes_during_dispatch() {
        let mut callbacks = Callbacks::new();
        callbacks.set(Event::MessageBegin, noop());

        let (handler, version) = callbacks.take(Event::MessageBegin).unwrap();
        callbacks.restore(Event::MessageBegin, handler, version);
        assert!(callbacks.is_bound(Event::MessageBegin));

        let (handler, version) = callbacks.take(Event::MessageBegin).unwrap();
        callbacks.clear();
        callbacks.restore(Event::MessageBegin, handler, version);
        assert!(!callbacks.is_bound(Event::MessageBegin));
        assert_eq!(callbacks.bound().count(), 0);
    }
}
