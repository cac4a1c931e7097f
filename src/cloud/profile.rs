// ABOUTME: FTP publishing profile of a web app.
// ABOUTME: Parsed from the management API's publish-settings XML document.

use super::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use secrecy::SecretString;
use std::collections::HashMap;

/// Endpoint and credentials for pushing files to a web app.
#[derive(Clone)]
pub struct PublishingProfile {
    pub ftp_url: String,
    pub ftp_username: String,
    pub ftp_password: SecretString,
}

impl PublishingProfile {
    pub fn new(
        ftp_url: impl Into<String>,
        ftp_username: impl Into<String>,
        ftp_password: SecretString,
    ) -> Self {
        Self {
            ftp_url: ftp_url.into(),
            ftp_username: ftp_username.into(),
            ftp_password,
        }
    }

    /// Extract the FTP profile from a `publishData` document.
    pub fn from_publish_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(Event::Start(element)) | Ok(Event::Empty(element))
                    if element.local_name().as_ref() == b"publishProfile" =>
                {
                    let attributes = profile_attributes(&element)?;
                    let is_ftp = attributes
                        .get("publishMethod")
                        .is_some_and(|method| method.eq_ignore_ascii_case("FTP"));
                    if is_ftp {
                        return Self::from_attributes(&attributes);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::InvalidProfile(format!(
                        "malformed publish settings: {}",
                        e
                    )));
                }
            }
        }

        Err(Error::InvalidProfile(
            "no FTP publish profile in publish settings".to_string(),
        ))
    }

    fn from_attributes(attributes: &HashMap<String, String>) -> Result<Self> {
        let field = |name: &str| {
            attributes
                .get(name)
                .cloned()
                .ok_or_else(|| Error::InvalidProfile(format!("FTP profile lacks {}", name)))
        };

        Ok(Self {
            ftp_url: field("publishUrl")?,
            ftp_username: field("userName")?,
            ftp_password: SecretString::from(field("userPWD")?),
        })
    }
}

impl std::fmt::Debug for PublishingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishingProfile")
            .field("ftp_url", &self.ftp_url)
            .field("ftp_username", &self.ftp_username)
            .field("ftp_password", &"<redacted>")
            .finish()
    }
}

/// Attribute values of one element, keyed by local name, with entities decoded.
fn profile_attributes(element: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut attributes = HashMap::new();
    for attribute in element.attributes() {
        let attribute = attribute
            .map_err(|e| Error::InvalidProfile(format!("malformed attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| Error::InvalidProfile(format!("malformed {} value: {}", key, e)))?;
        attributes.insert(key, value.into_owned());
    }
    Ok(attributes)
}
