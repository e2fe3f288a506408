use std::sync::Arc;

use exam_core::model::TestCatalog;
use services::{AccountService, AppServices, AttemptReviewAssembler, ProgressService};

/// Services and static data shared by every screen.
#[derive(Clone)]
pub struct AppContext {
    services: AppServices,
    catalog: Arc<TestCatalog>,
}

impl AppContext {
    #[must_use]
    pub fn new(services: AppServices, catalog: TestCatalog) -> Self {
        Self {
            services,
            catalog: Arc::new(catalog),
        }
    }

    #[must_use]
    pub fn services(&self) -> &AppServices {
        &self.services
    }

    #[must_use]
    pub fn catalog(&self) -> &TestCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        self.services.accounts()
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        self.services.progress()
    }

    #[must_use]
    pub fn reviews(&self) -> Arc<AttemptReviewAssembler> {
        self.services.reviews()
    }
}

// Built by the composition root (`crates/app`).

/// Build an `AppContext` over the default NACC catalog.
#[must_use]
pub fn build_app_context(services: AppServices) -> AppContext {
    AppContext::new(services, TestCatalog::nacc_default())
}
