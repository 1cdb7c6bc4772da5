//! Client library for a survey platform's SOAP web service.
//!
//! The crate wraps the service's remote operations behind a typed façade,
//! [`SurveyClient`], and turns its XML payloads into flat records. Modules are
//! kept narrow: the wire lives under [`feedback::tools::transport`], the XML
//! tree in [`feedback::tools::xml`], record flattening and projection in
//! [`feedback::tools::flatten`], file writers under [`feedback::tools::io`], and
//! fetch-then-write orchestration in [`feedback::tools::export`].

pub mod feedback;

pub use feedback::tools::client::SurveyClient;
pub use feedback::tools::{
    RemoteError, RemoteResult, Result, ToolError, client, config, error, export, flatten, io,
    model, result, transport, xml,
};
