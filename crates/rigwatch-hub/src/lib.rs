// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection hub: bidirectional socket fan-out to dashboard clients (spec
//! §4.8, C9).

pub mod frame;
pub mod hub;
pub mod session;

pub use frame::ServerFrame;
pub use hub::Hub;
pub use session::{Session, SessionHandle, SessionId, Subscription};
