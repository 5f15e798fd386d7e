use std::{
    env,
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use wxpay_logger::info;

use crate::error::{ClientError, result::ClientResultHelper};

/// Environment variable holding the path of the JSON configuration file.
pub const WXPAY_CONF_ENV: &str = "WXPAY_CONF";

/// Default client IP sent as `spbill_create_ip` / `client_ip`.
pub const DEFAULT_CLIENT_IP: &str = "127.0.0.1";

/// Default timeout of a gateway call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Merchant configuration, as read from a JSON file.
///
/// ```json
/// {
///     "appid": "wxd930ea5d5a258f4f",
///     "mch_id": "10000100",
///     "partner_key": "192006250b4c09247ec02edce69f6a2d",
///     "pkcs12_path": "/path/to/apiclient_cert.p12",
///     "api_v3_key": "0123456789abcdefABCDEF0123456789",
///     "notify_url": "https://merchant.example.com/wxpay/notify",
///     "refund_url": "https://merchant.example.com/wxpay/refund",
///     "spbill_create_ip": "10.0.0.1"
/// }
/// ```
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct GatewayConf {
    pub appid: String,
    pub mch_id: String,
    pub partner_key: String,
    /// Client certificate bundle used for the endpoints requiring mutual TLS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkcs12_path: Option<PathBuf>,
    /// Passphrase of the bundle; the gateway issues bundles protected by the merchant id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkcs12_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_v3_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spbill_create_ip: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GatewayConf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConf")
            .field("appid", &self.appid)
            .field("mch_id", &self.mch_id)
            .field("partner_key", &"****")
            .field("pkcs12_path", &self.pkcs12_path)
            .field("api_v3_key", &self.api_v3_key.as_ref().map(|_| "****"))
            .field("notify_url", &self.notify_url)
            .field("refund_url", &self.refund_url)
            .field("spbill_create_ip", &self.spbill_create_ip)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GatewayConf {
    /// Minimal configuration: the three mandatory merchant values.
    #[must_use]
    pub fn new(appid: &str, mch_id: &str, partner_key: &str) -> Self {
        Self {
            appid: appid.to_owned(),
            mch_id: mch_id.to_owned(),
            partner_key: partner_key.to_owned(),
            pkcs12_path: None,
            pkcs12_password: None,
            api_v3_key: None,
            notify_url: None,
            refund_url: None,
            spbill_create_ip: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Path of the configuration file, from:
    /// - the `conf` argument
    /// - the environment variable `WXPAY_CONF`
    pub fn location(conf: Option<PathBuf>) -> Result<PathBuf, ClientError> {
        if let Some(conf_path) = conf {
            if !conf_path.exists() {
                return Err(ClientError::Config(format!(
                    "Configuration file {} does not exist",
                    conf_path.display()
                )))
            }
            return Ok(conf_path)
        }
        match env::var(WXPAY_CONF_ENV).map(PathBuf::from) {
            Ok(conf_path) if conf_path.exists() => {
                info!("Using configuration file {}", conf_path.display());
                Ok(conf_path)
            }
            Ok(conf_path) => Err(ClientError::Config(format!(
                "Configuration file {} specified in {WXPAY_CONF_ENV} environment variable does \
                 not exist",
                conf_path.display()
            ))),
            Err(_) => Err(ClientError::Config(format!(
                "no configuration file given and {WXPAY_CONF_ENV} is not set"
            ))),
        }
    }

    pub fn load(conf_path: &Path) -> Result<Self, ClientError> {
        let file = File::open(conf_path).map_err(|e| {
            ClientError::Config(format!(
                "Unable to read configuration file {}: {e}",
                conf_path.display()
            ))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            ClientError::Config(format!(
                "Error while parsing configuration file {}: {e}",
                conf_path.display()
            ))
        })
    }

    pub fn save(&self, conf_path: &Path) -> Result<(), ClientError> {
        fs::write(
            conf_path,
            serde_json::to_string_pretty(&self)
                .with_context(|| format!("Unable to serialize configuration {self:?}"))?,
        )
        .with_context(|| format!("Unable to write configuration to {}", conf_path.display()))
    }

    /// Read the client certificate bundle, if one is configured.
    pub fn read_pkcs12(&self) -> Result<Option<Vec<u8>>, ClientError> {
        self.pkcs12_path
            .as_ref()
            .map(|path| {
                fs::read(path).map_err(|e| {
                    ClientError::Config(format!(
                        "Unable to read PKCS#12 bundle {}: {e}",
                        path.display()
                    ))
                })
            })
            .transpose()
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[expect(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::{env, path::PathBuf};

    use super::{DEFAULT_TIMEOUT_SECS, GatewayConf, WXPAY_CONF_ENV};
    use crate::ClientError;

    #[test]
    fn test_load() {
        // valid conf
        unsafe {
            env::set_var(WXPAY_CONF_ENV, "test_data/configs/wxpay.json");
        }
        let conf_path = GatewayConf::location(None).unwrap();
        let conf = GatewayConf::load(&conf_path).unwrap();
        assert_eq!(conf.mch_id, "10000100");
        assert_eq!(conf.spbill_create_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(conf.timeout_secs, 10);

        // partial conf: defaults apply
        let conf =
            GatewayConf::load(&PathBuf::from("test_data/configs/wxpay_partial.json")).unwrap();
        assert_eq!(conf.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(conf.pkcs12_path.is_none());

        // not found
        unsafe {
            env::set_var(WXPAY_CONF_ENV, "test_data/configs/not_found.json");
        }
        assert!(matches!(
            GatewayConf::location(None),
            Err(ClientError::Config(_))
        ));
        unsafe {
            env::remove_var(WXPAY_CONF_ENV);
        }
        assert!(GatewayConf::location(None).is_err());
        assert!(
            GatewayConf::location(Some(PathBuf::from("test_data/configs/wxpay.json"))).is_ok()
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut conf = GatewayConf::new("wx1", "100", "super-secret-partner-key");
        conf.api_v3_key = Some("another-secret".to_owned());
        let debug = format!("{conf:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("another-secret"));
    }
}
