use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::contract::model::{NewUser, RawNameRecord, RejectionRecord};
use crate::domain::error::HandleError;
use crate::domain::ports::metrics::{FN_HANDLING_DURATION, INVALID_FN_COUNT};
use crate::domain::ports::{Lookups, MetricsSink, RejectionPublisher, UserCache};
use crate::domain::repo::UsersRepository;
use crate::domain::validation::{ValidatedName, ValidationError};

/// Enrichment orchestrator: turns one raw stream payload into either a stored,
/// cached user or a published rejection.
/// Depends only on ports, not on infra types.
#[derive(Clone)]
pub struct EnrichmentService {
    repo: Arc<dyn UsersRepository>,
    cache: Arc<dyn UserCache>,
    lookups: Lookups,
    rejections: Arc<dyn RejectionPublisher>,
    metrics: Arc<dyn MetricsSink>,
}

impl EnrichmentService {
    /// Create a service with dependencies.
    pub fn new(
        repo: Arc<dyn UsersRepository>,
        cache: Arc<dyn UserCache>,
        lookups: Lookups,
        rejections: Arc<dyn RejectionPublisher>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            repo,
            cache,
            lookups,
            rejections,
            metrics,
        }
    }

    /// Handle one stream payload.
    ///
    /// Returns `Ok(())` both for a stored user and for a published rejection.
    /// `cancel` aborts in-flight lookups; storage and cache calls are not
    /// interrupted once started.
    #[instrument(name = "fn_enricher.service.handle", skip_all, fields(bytes = raw.len()))]
    pub async fn handle(&self, cancel: &CancellationToken, raw: &[u8]) -> Result<(), HandleError> {
        let started = Instant::now();
        let result = self.process(cancel, raw).await;
        self.metrics.observe(FN_HANDLING_DURATION, started.elapsed());
        result
    }

    async fn process(&self, cancel: &CancellationToken, raw: &[u8]) -> Result<(), HandleError> {
        let record: RawNameRecord = serde_json::from_slice(raw).map_err(HandleError::Decode)?;

        let validated = match ValidatedName::parse(&record) {
            Ok(validated) => validated,
            Err(err) => return self.reject(record, err).await,
        };

        let new_user = self.enrich(cancel, validated).await?;

        let user = self
            .repo
            .create_user(new_user)
            .await
            .map_err(|e| HandleError::storage(format!("{e:#}")))?;

        // The row is committed at this point; a cache failure still fails the call.
        self.cache
            .set(&user)
            .await
            .map_err(|e| HandleError::cache(format!("{e:#}")))?;

        info!(user_id = user.id, "Successfully stored enriched user");
        Ok(())
    }

    #[instrument(name = "fn_enricher.service.reject", skip_all, fields(reason = %err))]
    async fn reject(&self, record: RawNameRecord, err: ValidationError) -> Result<(), HandleError> {
        let message = err.message();
        self.metrics
            .inc_counter(INVALID_FN_COUNT, &[("reason", message.as_str())]);

        let payload = serde_json::to_vec(&RejectionRecord::new(record, message))
            .map_err(HandleError::EncodeRejection)?;

        self.rejections
            .publish(&payload)
            .await
            .map_err(|e| HandleError::publish(format!("{e:#}")))?;

        debug!("Rejection published");
        Ok(())
    }

    /// Resolve all three attributes concurrently. The first failure drops the
    /// other in-flight calls and nothing is returned for storage.
    #[instrument(name = "fn_enricher.service.enrich", skip_all, fields(name = %validated.name()))]
    async fn enrich(
        &self,
        cancel: &CancellationToken,
        validated: ValidatedName,
    ) -> Result<NewUser, HandleError> {
        let name = validated.name();
        let fan_out = async {
            tokio::try_join!(
                self.lookups.age.resolve(name),
                self.lookups.gender.resolve(name),
                self.lookups.nationality.resolve(name),
            )
        };

        let (age, gender, nationality) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HandleError::Cancelled),
            resolved = fan_out => resolved?,
        };

        debug!(age, %gender, %nationality, "Attributes resolved");
        Ok(validated.enrich(age, gender, nationality))
    }
}
