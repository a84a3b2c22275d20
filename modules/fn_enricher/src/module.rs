use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::FnEnricherConfig;
use crate::domain::ports::{Lookups, RejectionPublisher, UserCache};
use crate::domain::repo::UsersRepository;
use crate::domain::service::EnrichmentService;
use crate::domain::user_service::UserService;
use crate::infra::cache::RedisUserCache;
use crate::infra::kafka::{KafkaPartitionStream, KafkaRejectionPublisher, KafkaSettings};
use crate::infra::lookup::{AgeLookup, GenderLookup, NationalityLookup};
use crate::infra::metrics::InMemoryMetrics;
use crate::infra::storage::{Migrator, SeaOrmUsersRepository};
use crate::pipeline::consumer::PartitionedConsumer;
use crate::pipeline::source::MessageStream;

/// Module root: owns the configured services and runs the consumer.
#[derive(Clone)]
pub struct FnEnricher {
    config: FnEnricherConfig,
    service: Arc<EnrichmentService>,
    users: UserService,
    metrics: Arc<InMemoryMetrics>,
}

impl FnEnricher {
    /// Wire the production adapters: SeaORM storage, Redis cache, Kafka
    /// rejection producer and HTTP lookups.
    pub async fn init(
        config: FnEnricherConfig,
        db: DatabaseConnection,
        redis_url: &str,
    ) -> anyhow::Result<Self> {
        info!("Initializing fn_enricher module");
        config.validate()?;

        let repo = Arc::new(SeaOrmUsersRepository::new(db));
        let cache = Arc::new(RedisUserCache::connect(redis_url).await?);
        let rejections = Arc::new(KafkaRejectionPublisher::new(
            &kafka_settings(&config),
            config.rejection_topic.clone(),
            config.rejection_send_timeout,
        )?);

        Self::with_adapters(config, repo, cache, rejections)
    }

    /// Wire the domain over caller-provided storage, cache and rejection
    /// adapters. Lookups are always built from the configured endpoints.
    pub fn with_adapters(
        config: FnEnricherConfig,
        repo: Arc<dyn UsersRepository>,
        cache: Arc<dyn UserCache>,
        rejections: Arc<dyn RejectionPublisher>,
    ) -> anyhow::Result<Self> {
        let lookups = build_lookups(&config)?;
        debug!(
            age = %config.age_url,
            gender = %config.gender_url,
            nationality = %config.nationality_url,
            timeout_ms = config.lookup_timeout.as_millis() as u64,
            "Lookup clients configured"
        );

        let metrics = Arc::new(InMemoryMetrics::new());
        let service = Arc::new(EnrichmentService::new(
            repo.clone(),
            cache.clone(),
            lookups,
            rejections,
            metrics.clone(),
        ));
        let users = UserService::new(repo, cache);

        Ok(Self {
            config,
            service,
            users,
            metrics,
        })
    }

    /// Apply pending schema migrations.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running fn_enricher database migrations");
        Migrator::up(db, None)
            .await
            .context("fn_enricher migrations failed")?;
        info!("fn_enricher database migrations completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &FnEnricherConfig {
        &self.config
    }

    pub fn enrichment_service(&self) -> Arc<EnrichmentService> {
        self.service.clone()
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn metrics(&self) -> &InMemoryMetrics {
        &self.metrics
    }

    /// Consume the configured Kafka topic until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let stream = KafkaPartitionStream::new(kafka_settings(&self.config), &self.config.topic);
        self.run_with_stream(stream, cancel).await
    }

    /// Consume any partitioned stream with the configured pool size.
    pub async fn run_with_stream<S: MessageStream>(
        &self,
        stream: S,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        info!(
            topic = %self.config.topic,
            workers = self.config.workers_count,
            "Starting fn_enricher consumer"
        );
        let consumer = PartitionedConsumer::new(
            stream,
            self.service.clone(),
            self.config.workers_count,
            self.config.shutdown_timeout,
        );
        let result = consumer.run(cancel).await;
        self.metrics.log_summary();
        result
    }
}

fn kafka_settings(config: &FnEnricherConfig) -> KafkaSettings {
    KafkaSettings {
        brokers: config.brokers.clone(),
        group_id: config.consumer_group.clone(),
    }
}

fn build_lookups(config: &FnEnricherConfig) -> anyhow::Result<Lookups> {
    Ok(Lookups {
        age: Arc::new(AgeLookup::new(
            config.age_endpoint()?,
            config.lookup_timeout,
        )?),
        gender: Arc::new(GenderLookup::new(
            config.gender_endpoint()?,
            config.lookup_timeout,
        )?),
        nationality: Arc::new(NationalityLookup::new(
            config.nationality_endpoint()?,
            config.lookup_timeout,
        )?),
    })
}
