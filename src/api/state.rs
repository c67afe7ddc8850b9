use std::sync::Arc;

use derive_new::new;

use crate::auth::Authenticator;
use crate::database::Database;
use crate::service::media::MediaStore;

/// Shared by every request. Cloning is cheap.
#[derive(Debug, Clone, new)]
pub struct App {
    pub database: Database,
    pub media: Arc<dyn MediaStore>,
    pub authenticator: Arc<Authenticator>,
}

impl App {
    pub fn media(&self) -> &dyn MediaStore {
        self.media.as_ref()
    }
}
