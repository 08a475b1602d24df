use std::sync::Arc;

use crate::auth::JwtManager;
use crate::config::Settings;
use crate::repositories::{
    AccessRepository, ActRepository, CatalogRepository, HealthCheck, LabeledRepository,
    LotRepository, PreCatastralRepository, ReportRepository,
};
use crate::services::{
    AccessService, ActService, CatalogService, LabeledService, LotService, PreCatastralService,
    ReportService,
};

/// Repository implementations the services are wired onto.
pub struct Repositories {
    pub acts: Arc<dyn ActRepository>,
    pub pre_catastrals: Arc<dyn PreCatastralRepository>,
    pub lots: Arc<dyn LotRepository>,
    pub labeled: Arc<dyn LabeledRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub access: Arc<dyn AccessRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub health: Arc<dyn HealthCheck>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jwt: Arc<JwtManager>,
    pub health: Arc<dyn HealthCheck>,
    pub acts: Arc<ActService>,
    pub pre_catastrals: Arc<PreCatastralService>,
    pub lots: Arc<LotService>,
    pub labeled: Arc<LabeledService>,
    pub catalog: Arc<CatalogService>,
    pub access: Arc<AccessService>,
    pub reports: Arc<ReportService>,
}

impl AppState {
    pub fn new(settings: Settings, repos: Repositories) -> Self {
        let jwt = Arc::new(JwtManager::new(
            &settings.auth.jwt_secret,
            settings.auth.token_expiry_seconds,
        ));

        Self {
            jwt: jwt.clone(),
            health: repos.health,
            acts: Arc::new(ActService::new(repos.acts)),
            pre_catastrals: Arc::new(PreCatastralService::new(repos.pre_catastrals)),
            lots: Arc::new(LotService::new(repos.lots)),
            labeled: Arc::new(LabeledService::new(repos.labeled)),
            catalog: Arc::new(CatalogService::new(repos.catalog)),
            access: Arc::new(AccessService::new(repos.access, jwt)),
            reports: Arc::new(ReportService::new(repos.reports, settings.report.batch_size)),
            settings: Arc::new(settings),
        }
    }
}
