use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::StatusCode;

use crate::config::Config;
use crate::error::VerifierError;

/// Character owned by the claimed credential, tagged with its current
/// corporation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedCharacter {
    pub character_id: i64,
    pub name: String,
    pub corp_id: i64,
}

/// Proof-of-ownership collaborator: resolves an API credential pair to the
/// characters it owns. Failure modes are kept distinct so the controller can
/// map them to different user-facing rejections.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn characters(
        &self,
        key_id: &str,
        code: &str,
    ) -> Result<Vec<OwnedCharacter>, VerifierError>;
}

#[async_trait]
impl<T: Verifier + ?Sized> Verifier for std::sync::Arc<T> {
    async fn characters(
        &self,
        key_id: &str,
        code: &str,
    ) -> Result<Vec<OwnedCharacter>, VerifierError> {
        (**self).characters(key_id, code).await
    }
}

pub const DEFAULT_API_URL: &str = "https://api.eveonline.com";

/// Verifier backed by the game's XML account API
/// (`/account/Characters.xml.aspx?keyID=..&vCode=..`).
pub struct XmlApiVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl XmlApiVerifier {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.verifier_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .verifier_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }
}

#[async_trait]
impl Verifier for XmlApiVerifier {
    async fn characters(
        &self,
        key_id: &str,
        code: &str,
    ) -> Result<Vec<OwnedCharacter>, VerifierError> {
        let key_id = key_id.trim();
        let code = code.trim();

        // Key ids are numeric; reject garbage before spending a round trip.
        if key_id.is_empty() || code.is_empty() || !key_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VerifierError::BadCredential);
        }

        let url = format!("{}/account/Characters.xml.aspx", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("keyID", key_id), ("vCode", code)])
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(VerifierError::BadCredential);
        }
        if !status.is_success() {
            return Err(VerifierError::Rejected(format!("status {status}")));
        }

        let body = resp.text().await.map_err(transport)?;
        parse_characters(&body)
    }
}

fn transport(err: reqwest::Error) -> VerifierError {
    VerifierError::Unreachable(err.to_string())
}

/// Decode a character list response. `<error code="..">..</error>` rows are
/// API-level failures; codes in the 2xx band mean the key itself was bad.
fn parse_characters(body: &str) -> Result<Vec<OwnedCharacter>, VerifierError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut rows = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"row" => {
                if let Some(character) = parse_row(&e)? {
                    rows.push(character);
                }
            }
            Ok(Event::Start(e)) if e.name().as_ref() == b"error" => {
                let code = attr_value(&e, "code")
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(0);
                let message = reader
                    .read_text(e.name())
                    .map(|t| t.trim().to_string())
                    .unwrap_or_default();
                return Err(classify_api_error(code, message));
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"error" => {
                let code = attr_value(&e, "code")
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(0);
                return Err(classify_api_error(code, String::new()));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(VerifierError::Unreachable(format!(
                    "malformed response: {e}"
                )));
            }
        }
    }

    Ok(rows)
}

fn parse_row(e: &BytesStart<'_>) -> Result<Option<OwnedCharacter>, VerifierError> {
    // Rows missing the character columns belong to some other rowset.
    let (Some(character_id), Some(corp_id)) =
        (attr_value(e, "characterID"), attr_value(e, "corporationID"))
    else {
        return Ok(None);
    };

    let character_id = character_id.parse().map_err(|_| {
        VerifierError::Unreachable(format!("malformed characterID: {character_id:?}"))
    })?;
    let corp_id = corp_id
        .parse()
        .map_err(|_| VerifierError::Unreachable(format!("malformed corporationID: {corp_id:?}")))?;

    Ok(Some(OwnedCharacter {
        character_id,
        name: attr_value(e, "name").unwrap_or_default(),
        corp_id,
    }))
}

fn attr_value(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn classify_api_error(code: i64, message: String) -> VerifierError {
    // 2xx error codes are authentication/key problems (e.g. 203
    // "Authentication failure"); everything else is an upstream refusal.
    if (200..300).contains(&code) {
        VerifierError::BadCredential
    } else if message.is_empty() {
        VerifierError::Rejected(format!("error code {code}"))
    } else {
        VerifierError::Rejected(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CHARACTERS: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<eveapi version="2">
  <currentTime>2026-08-24 12:00:00</currentTime>
  <result>
    <rowset name="characters" key="characterID" columns="name,characterID,corporationName,corporationID">
      <row name="Breni Tival" characterID="150337897" corporationName="Spearmint" corporationID="98000001"/>
      <row name="Alt Mcaltface" characterID="150337898" corporationName="Elsewhere" corporationID="109299958"/>
    </rowset>
  </result>
  <cachedUntil>2026-08-24 12:30:00</cachedUntil>
</eveapi>"#;

    #[test]
    fn parses_character_rows() {
        let rows = parse_characters(TWO_CHARACTERS).unwrap();
        assert_eq!(
            rows,
            vec![
                OwnedCharacter {
                    character_id: 150337897,
                    name: "Breni Tival".into(),
                    corp_id: 98000001,
                },
                OwnedCharacter {
                    character_id: 150337898,
                    name: "Alt Mcaltface".into(),
                    corp_id: 109299958,
                },
            ]
        );
    }

    #[test]
    fn empty_rowset_is_ok_and_empty() {
        let body = r#"<eveapi version="2"><result><rowset name="characters"/></result></eveapi>"#;
        assert_eq!(parse_characters(body).unwrap(), vec![]);
    }

    #[test]
    fn auth_error_code_maps_to_bad_credential() {
        let body = r#"<eveapi version="2"><error code="203">Authentication failure.</error></eveapi>"#;
        assert!(matches!(
            parse_characters(body),
            Err(VerifierError::BadCredential)
        ));
    }

    #[test]
    fn other_error_code_is_rejected_with_message() {
        let body = r#"<eveapi version="2"><error code="516">Timeout contacting cluster.</error></eveapi>"#;
        match parse_characters(body) {
            Err(VerifierError::Rejected(msg)) => {
                assert_eq!(msg, "Timeout contacting cluster.")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn truncated_body_is_unreachable() {
        let body = r#"<eveapi><result><rowset name="characters"><row name="x" characterID="1""#;
        assert!(matches!(
            parse_characters(body),
            Err(VerifierError::Unreachable(_))
        ));
    }

    #[test]
    fn garbled_character_id_is_unreachable() {
        let body = r#"<eveapi><result><row characterID="xyz" corporationID="5"/></result></eveapi>"#;
        assert!(matches!(
            parse_characters(body),
            Err(VerifierError::Unreachable(_))
        ));
    }
}
