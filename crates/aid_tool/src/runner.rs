use std::{fmt, sync::Arc};

use tokio_util::sync::CancellationToken;

type Reporter = Arc<dyn Fn(&str) + Send + Sync>;

/// Handed to a tool while it runs.
///
/// Carries the cancellation token of the current turn and a callback for
/// progress reports.
#[derive(Clone)]
pub struct Runner {
    cancel: CancellationToken,
    report: Reporter,
}

impl Runner {
    pub fn new(cancel: CancellationToken, report: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            cancel,
            report: Arc::new(report),
        }
    }

    /// A runner that is never cancelled and discards reports.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(CancellationToken::new(), |_| {})
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the turn is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    pub fn report(&self, status: &str) {
        (self.report)(status);
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
