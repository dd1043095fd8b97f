use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, gateway::PaymentGateway, staging::PreOrderStaging};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub staging: PreOrderStaging,
    pub gateway: Arc<dyn PaymentGateway>,
}
