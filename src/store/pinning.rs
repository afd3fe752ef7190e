//! IPFS pinning-service store.
//!
//! Uploads go to a Pinata-style `pinFileToIPFS` endpoint as one multipart
//! request whose file names are prefixed with the package name, so the
//! returned hash addresses the wrapping directory. Listings use a Kubo
//! `ls` API and file reads use an HTTP gateway.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{ContentStore, EntryKind, StoreEntry, StoreError};
use crate::core::ContentAddress;
use crate::util::fs::list_files;

pub const DEFAULT_PIN_URL: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs/";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5001/api/v0/";

/// Store backed by a pinning service, an IPFS API and a gateway.
pub struct PinningStore {
    pin_url: Url,
    api_url: Url,
    gateway_url: Url,
    jwt: Option<String>,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PinResponse {
    ipfs_hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LsResponse {
    objects: Vec<LsObject>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LsObject {
    #[serde(default)]
    links: Vec<LsLink>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LsLink {
    name: String,
    hash: String,
    #[serde(rename = "Type")]
    kind: u8,
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport {
        message: err.to_string(),
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl PinningStore {
    pub fn new(
        pin_url: Url,
        api_url: Url,
        gateway_url: Url,
        jwt: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;

        Ok(PinningStore {
            pin_url,
            api_url: with_trailing_slash(api_url),
            gateway_url: with_trailing_slash(gateway_url),
            jwt,
            client,
        })
    }

    fn join(base: &Url, path: &str) -> Result<Url, StoreError> {
        base.join(path).map_err(|e| StoreError::Transport {
            message: format!("invalid store url: {}", e),
        })
    }
}

/// Multipart file names for every file under `dir`, wrapped in `name/`.
fn upload_paths(dir: &Path, name: &str) -> Result<Vec<(String, PathBuf)>, StoreError> {
    let files = list_files(dir).map_err(|e| StoreError::Io {
        path: dir.to_path_buf(),
        source: std::io::Error::other(format!("{:#}", e)),
    })?;

    Ok(files
        .into_iter()
        .map(|rel| {
            let parts: Vec<_> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            (format!("{}/{}", name, parts.join("/")), dir.join(rel))
        })
        .collect())
}

fn entries_from_ls(response: LsResponse) -> Result<Vec<StoreEntry>, StoreError> {
    let object = response
        .objects
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::Transport {
            message: "empty listing".to_string(),
        })?;

    Ok(object
        .links
        .into_iter()
        .map(|link| StoreEntry {
            name: link.name,
            kind: if link.kind == 1 {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            address: ContentAddress::new(link.hash),
        })
        .collect())
}

impl PinningStore {
    fn jwt(&self) -> Result<&str, StoreError> {
        self.jwt.as_deref().ok_or_else(|| StoreError::Unconfigured {
            message: "Please register pinata jwt (set PINATA_JWT in .env)".to_string(),
        })
    }
}

impl ContentStore for PinningStore {
    fn ensure_ready(&self) -> Result<(), StoreError> {
        self.jwt().map(|_| ())
    }

    fn upload(&self, dir: &Path, name: &str) -> Result<ContentAddress, StoreError> {
        let jwt = self.jwt()?;

        let mut form = Form::new();
        for (file_name, path) in upload_paths(dir, name)? {
            let data = std::fs::read(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            form = form.part("file", Part::bytes(data).file_name(file_name));
        }
        form = form.text("pinataMetadata", json!({ "name": name }).to_string());

        tracing::debug!("POST {}", self.pin_url);
        let response = self
            .client
            .post(self.pin_url.clone())
            .bearer_auth(jwt)
            .multipart(form)
            .send()
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Rejected {
                message: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        let pinned: PinResponse = response.json().map_err(transport)?;
        Ok(ContentAddress::new(pinned.ipfs_hash))
    }

    fn list(&self, address: &ContentAddress) -> Result<Vec<StoreEntry>, StoreError> {
        let mut url = Self::join(&self.api_url, "ls")?;
        url.query_pairs_mut().append_pair("arg", address.as_str());

        tracing::debug!("POST {}", url);
        let response = self.client.post(url).send().map_err(transport)?;
        if !response.status().is_success() {
            return Err(StoreError::Missing {
                address: address.clone(),
            });
        }

        let listing: LsResponse = response.json().map_err(transport)?;
        entries_from_ls(listing)
    }

    fn read(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError> {
        let url = Self::join(&self.gateway_url, address.as_str())?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().map_err(transport)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::Missing {
                address: address.clone(),
            });
        }
        if !response.status().is_success() {
            return Err(StoreError::Transport {
                message: format!("gateway returned HTTP {}", response.status()),
            });
        }

        Ok(response.bytes().map_err(transport)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_upload_paths_are_wrapped_in_package_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("config.json"), "{}").unwrap();
        fs::write(tmp.path().join("src").join("ERC20.sol"), "").unwrap();

        let names: Vec<_> = upload_paths(tmp.path(), "ERC20")
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["ERC20/config.json", "ERC20/src/ERC20.sol"]);
    }

    #[test]
    fn test_ls_listing_kinds() {
        let raw = r#"{"Objects":[{"Hash":"QmRoot","Links":[
            {"Name":"config.json","Hash":"QmA","Size":10,"Type":2},
            {"Name":"src","Hash":"QmB","Size":0,"Type":1}
        ]}]}"#;
        let entries = entries_from_ls(serde_json::from_str(raw).unwrap()).unwrap();
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[1].kind, EntryKind::Directory);
        assert_eq!(entries[1].address.as_str(), "QmB");
    }

    fn store(jwt: Option<&str>) -> PinningStore {
        PinningStore::new(
            Url::parse(DEFAULT_PIN_URL).unwrap(),
            Url::parse(DEFAULT_API_URL).unwrap(),
            Url::parse(DEFAULT_GATEWAY_URL).unwrap(),
            jwt.map(str::to_string),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_upload_without_token_is_rejected() {
        let tmp = TempDir::new().unwrap();

        let err = store(None).upload(tmp.path(), "ERC20").unwrap_err();
        assert!(matches!(err, StoreError::Unconfigured { .. }));
        assert!(err.to_string().contains("pinata jwt"));
    }

    #[test]
    fn test_ready_requires_token() {
        assert!(store(None).ensure_ready().is_err());
        assert!(store(Some("jwt")).ensure_ready().is_ok());
    }

    #[test]
    fn test_gateway_url_joins_address() {
        let base = with_trailing_slash(Url::parse("https://gateway.example/ipfs").unwrap());
        assert_eq!(
            PinningStore::join(&base, "QmX").unwrap().as_str(),
            "https://gateway.example/ipfs/QmX"
        );
    }
}
