// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod bridge;
pub mod codec;
pub mod fallback;
pub mod filter;
pub mod merge;
pub mod profile;
pub mod queue;
pub mod sync;

pub use bridge::{CalendarBridge, NotificationBridge, TracingBridge};
pub use codec::{ImageCodec, JpegCodec};
pub use fallback::{FallbackCatalog, FallbackError};
pub use merge::{merge, MergeSources};
pub use profile::ProfileService;
pub use sync::{ActivityStore, FetchReport, SyncBackends};
