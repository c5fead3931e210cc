use crate::protocol::{AssemblyError, Headers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InField,
    InValue,
}

/// Joins header name and value fragments into complete pairs.
///
/// Fragments of the same kind are appended to each other. A change from value
/// to name fragments completes a pair, which is merged into the [`Headers`]
/// being built.
#[derive(Debug)]
pub struct HeaderAccumulator {
    state: State,
    field: Vec<u8>,
    value: Vec<u8>,
    headers: Headers,
}

impl HeaderAccumulator {
    pub fn new() -> Self {
        Self { state: State::Start, field: Vec::new(), value: Vec::new(), headers: Headers::new() }
    }

    pub fn on_field(&mut self, data: &[u8]) {
        match self.state {
            State::Start | State::InField => {}
            State::InValue => self.flush(),
        }
        self.field.extend_from_slice(data);
        self.state = State::InField;
    }

    /// # Errors
    ///
    /// [`AssemblyError::InvalidHeaderState`] if no name precedes the value.
    pub fn on_value(&mut self, data: &[u8]) -> Result<(), AssemblyError> {
        if self.state == State::Start {
            return Err(AssemblyError::invalid_header_state("value"));
        }
        self.value.extend_from_slice(data);
        self.state = State::InValue;
        Ok(())
    }

    /// Flushes the pending pair and hands out the headers, leaving the
    /// accumulator ready for the next message.
    ///
    /// # Errors
    ///
    /// [`AssemblyError::InvalidHeaderState`] if a name has no value.
    pub fn finish(&mut self) -> Result<Headers, AssemblyError> {
        match self.state {
            State::Start => {}
            State::InField => return Err(AssemblyError::invalid_header_state("field")),
            State::InValue => self.flush(),
        }
        self.state = State::Start;
        Ok(std::mem::take(&mut self.headers))
    }

    fn flush(&mut self) {
        let field = String::from_utf8_lossy(&self.field);
        let value = String::from_utf8_lossy(&self.value);
        self.headers.set(&*field, value);
        self.field.clear();
        self.value.clear();
    }
}

impl Default for HeaderAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
