mod drive_client;
mod token_manager;

pub use drive_client::GoogleDriveAdapter;
