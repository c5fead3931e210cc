use http::{Method, Version};

use crate::codec::Head;

/// What the current message's head said, cleared at every message boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Session {
    pub(crate) method: Option<Method>,
    pub(crate) status_code: Option<u16>,
    pub(crate) version: Option<Version>,
    pub(crate) content_length: Option<u64>,
    pub(crate) chunked: bool,
    pub(crate) keep_alive: bool,
}

impl Session {
    pub(crate) fn apply(&mut self, head: Head) {
        self.method = head.method;
        self.status_code = head.status_code;
        self.version = Some(head.version);
        self.content_length = head.content_length;
        self.chunked = head.chunked;
        self.keep_alive = head.keep_alive;
    }

    pub(crate) fn clear(&mut self) {
        *self = Session::default();
    }
}
