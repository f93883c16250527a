//! Handler and upstream-client tests.
//!
//! Route tests drive the actix service with hand-built multipart bodies and a stub analyzer;
//! upstream tests point the real client at a WireMock chat-completions endpoint.

mod support;
