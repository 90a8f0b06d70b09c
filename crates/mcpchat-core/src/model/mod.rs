//! Model clients
//!
//! The conversation loop talks to the model through [`ModelClient`]. The
//! production implementation targets Azure OpenAI chat completions; the mock
//! is used by tests and by the CLI's offline mode.

mod error;
mod traits;
mod azure;
pub mod convert;
mod mock;

pub use error::{ModelError, ModelResult};
pub use traits::{CompletionOptions, ModelClient};
pub use azure::{AzureOpenAiClient, AzureOpenAiConfig, DEFAULT_API_VERSION, DEFAULT_REQUEST_TIMEOUT};
pub use mock::{MockMode, MockModel, MockRequest, MockStep};
