//! Step definitions
//!
//! A step is a name plus an asynchronous operation. Steps carry no data to
//! one another: a later step relies on the durable ledger state left behind
//! by the earlier ones, so the order of the list is the only dependency
//! declaration.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::common::Result;

/// The operation a step performs against the outside world
#[async_trait]
pub trait StepOperation: Send + Sync {
    /// Run the operation to settlement
    async fn execute(&self) -> Result<()>;

    /// Short human-readable description of what the operation does
    fn describe(&self) -> String {
        "custom operation".to_string()
    }
}

/// One named, ordered unit of a suite
pub struct Step {
    name: String,
    operation: Box<dyn StepOperation>,
}

impl Step {
    pub fn new(name: impl Into<String>, operation: impl StepOperation + 'static) -> Self {
        Self {
            name: name.into(),
            operation: Box::new(operation),
        }
    }

    /// Build a step from an async closure
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::new(name, FnOperation(f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self) -> &dyn StepOperation {
        self.operation.as_ref()
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("operation", &self.operation.describe())
            .finish()
    }
}

struct FnOperation<F>(F);

#[async_trait]
impl<F, Fut> StepOperation for FnOperation<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn execute(&self) -> Result<()> {
        (self.0)().await
    }
}
