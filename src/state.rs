use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::services::recommendation::RecommendationService;
use crate::services::workflow::BookingWorkflow;

pub struct AppState {
    pub config: AppConfig,
    pub catalog: Catalog,
    pub workflow: BookingWorkflow,
    pub recommender: Box<dyn RecommendationService>,
}
