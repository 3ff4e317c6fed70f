mod server;

pub use server::{CONFIG_FILE_NAME, DB_FILE_NAME, FileConfig, InvoiceConfig, ServerConfig};
