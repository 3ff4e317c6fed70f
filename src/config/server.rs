use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "shopdesk.toml";
pub const DB_FILE_NAME: &str = "shopdesk.db";
pub const LOGO_FILE_NAME: &str = "logo.png";
pub const STAMP_FILE_NAME: &str = "stamp.png";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Lifetime of a login session.
    pub session_ttl_hours: i64,
    pub invoice: InvoiceConfig,
}

/// Settings for rendered invoices and quotes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InvoiceConfig {
    /// Printed as the issuing company on every document.
    pub issuer_name: String,
    /// Directory holding `<family>-Regular.ttf`, `-Bold`, `-Italic` and `-BoldItalic`.
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub tax_rate_percent: i64,
    /// Drawn at the top of the document when the file exists.
    pub logo_path: Option<PathBuf>,
    /// Seal drawn next to the issuer when the file exists.
    pub stamp_path: Option<PathBuf>,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            issuer_name: "Shopdesk Trading Co.".to_string(),
            fonts_dir: PathBuf::from("./fonts"),
            font_family: "NotoSansJP".to_string(),
            tax_rate_percent: 10,
            logo_path: None,
            stamp_path: None,
        }
    }
}

/// On-disk `shopdesk.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub session_ttl_hours: Option<i64>,
    #[serde(default)]
    pub invoice: Option<InvoiceConfig>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Loads `path` if given, else `<data_dir>/shopdesk.toml` when it exists.
    pub fn discover(data_dir: &Path, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = data_dir.join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Applies file values on top of the defaults. Command-line flags are
    /// applied by the caller afterwards so they take precedence.
    #[must_use]
    pub fn with_file(mut self, file: FileConfig) -> Self {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(ttl) = file.session_ttl_hours {
            self.session_ttl_hours = ttl;
        }
        if let Some(invoice) = file.invoice {
            self.invoice = invoice;
        }
        self
    }

    /// Invoice settings with unset image paths pointing at `logo.png` and
    /// `stamp.png` in the data directory.
    #[must_use]
    pub fn invoice_settings(&self) -> InvoiceConfig {
        let mut invoice = self.invoice.clone();
        invoice
            .logo_path
            .get_or_insert_with(|| self.data_dir.join(LOGO_FILE_NAME));
        invoice
            .stamp_path
            .get_or_insert_with(|| self.data_dir.join(STAMP_FILE_NAME));
        invoice
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_hours <= 0 {
            return Err(Error::Config("session_ttl_hours must be positive".into()));
        }
        if !(0..=100).contains(&self.invoice.tax_rate_percent) {
            return Err(Error::Config(
                "invoice.tax_rate_percent must be between 0 and 100".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            session_ttl_hours: 12,
            invoice: InvoiceConfig::default(),
        }
    }
}
