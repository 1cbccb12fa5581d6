use std::sync::Arc;

use crate::handler::UploadHandler;

pub struct PixAxumState {
    pub handler: Arc<UploadHandler>,
}

impl Clone for PixAxumState {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl PixAxumState {
    pub fn new(handler: UploadHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}
