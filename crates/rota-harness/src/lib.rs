#![forbid(unsafe_code)]

//! Rota Harness
//!
//! Scriptable in-memory fakes for the engine's two external collaborators:
//!
//! - [`InMemoryRemote`] - a [`rota_sync::RemoteStore`] whose failures can
//!   be scripted per operation, with attempt counters for retry tests
//! - [`FakeCalendar`] - a [`rota_core::CalendarPort`] over an in-memory
//!   event map, with out-of-band mutation helpers for inverse-failure
//!   tests
//!
//! The fakes are deterministic: no clocks, no threads, no randomness of
//! their own. Everything a test observes is a direct consequence of the
//! calls it made.

pub mod calendar;
pub mod remote;

pub use calendar::FakeCalendar;
pub use remote::InMemoryRemote;
