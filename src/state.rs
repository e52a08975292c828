use crate::api::ApiClient;
use crate::config::Config;
use crate::habits::HabitsView;
use crate::storage::ClientStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub view: HabitsView,
}

impl AppState {
    pub fn new(backend_url: &str, store: ClientStore) -> Self {
        let api = ApiClient::new(backend_url, Arc::new(Mutex::new(store)));
        Self {
            view: HabitsView::new(api),
        }
    }

    pub async fn from_config(config: &Config) -> Self {
        let store = ClientStore::open(config.data_path.clone()).await;
        Self::new(&config.backend_url, store)
    }
}
