//! HTTP layer — `ApiHttp`, the shared request pipeline every call goes through.

pub mod client;
pub mod options;

pub use client::{ApiHttp, Response};
pub use options::{Dispatch, ErrorSink, RequestOptions};
