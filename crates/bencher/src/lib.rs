/// Chunk sizes the feed benchmarks split each input into.
pub const CHUNK_SIZES: [usize; 3] = [8, 64, 8192];

pub static GET_SMALL: Fixture = Fixture::request("small_header", include_str!("../resources/request/get_small.txt"));
pub static GET_LARGE: Fixture = Fixture::request("large_header", include_str!("../resources/request/get_large.txt"));
pub static CHUNKED_RESPONSE: Fixture =
    Fixture::response("chunked_response", include_str!("../resources/response/chunked.txt"));

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FixtureKind {
    Request,
    Response,
}

/// A complete HTTP/1.x message used as benchmark input.
#[derive(Debug, Copy, Clone)]
pub struct Fixture {
    name: &'static str,
    kind: FixtureKind,
    content: &'static str,
}

impl Fixture {
    pub const fn request(name: &'static str, content: &'static str) -> Self {
        Self { name, kind: FixtureKind::Request, content }
    }

    pub const fn response(name: &'static str, content: &'static str) -> Self {
        Self { name, kind: FixtureKind::Response, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FixtureKind {
        self.kind
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.content.as_bytes()
    }

    /// Input length, for criterion throughput.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Every request fixture, smallest first.
pub fn requests() -> [Fixture; 2] {
    [GET_SMALL, GET_LARGE]
}
