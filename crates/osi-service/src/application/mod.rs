//! Application layer for osi-service.
//!
//! | Module       | Purpose                                                   |
//! |--------------|-----------------------------------------------------------|
//! | `dispatcher` | Frame → typed command → facade or capture → one response  |
//! | `facade`     | Mouse, keyboard, screen and system operations             |
//! | `imaging`    | PNG encoding, grayscale and Otsu binarization, base64     |
//! | `capture`    | Interactive capture sessions on their own thread          |
//!
//! Everything here talks to the OS only through the port traits in
//! `crate::infrastructure`, so the whole layer runs against mocks in tests.

pub mod capture;
pub mod dispatcher;
pub mod facade;
pub mod imaging;

pub use dispatcher::Dispatcher;
pub use facade::{FacadeError, OsFacade};
