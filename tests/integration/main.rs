//! Integration tests: full sessions against in-memory platforms.

mod mock_platform;
mod session_flow;
