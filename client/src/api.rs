//! Typed mirrors of the Plex API payloads. Every response nests its data
//! inside a `MediaContainer` envelope.

use serde::{
    Deserialize,
    Deserializer,
};

/// Response of the `/media/providers` server identity probe.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfoResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: ServerInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    #[serde(rename = "machineIdentifier")]
    pub id: String,
    #[serde(rename = "friendlyName")]
    pub name: String,
    pub version: String,
    pub platform: String,
}

/// Response of the `/status/sessions` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionList {
    #[serde(rename = "MediaContainer")]
    pub media_container: Sessions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Sessions {
    pub size: i64,
    #[serde(rename = "Metadata")]
    pub metadata: Vec<SessionMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionMetadata {
    #[serde(rename = "Session")]
    pub session: Session,
    #[serde(rename = "Player")]
    pub player: Player,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Session {
    pub bandwidth: i64,
    pub location: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Player {
    pub device: String,
    pub platform: String,
    pub profile: String,
    pub state: String,
    pub local: bool,
    pub relayed: bool,
    pub secure: bool,
}

/// Response of the `/library/sections` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: Library,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Library {
    #[serde(rename = "Directory")]
    pub sections: Vec<LibrarySection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LibrarySection {
    /// Section ids arrive as strings but are numeric for every known server.
    #[serde(rename = "key")]
    pub id: String,
    #[serde(rename = "title")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Response of the `/library/sections/{id}/all` size probe.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: SectionContainer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SectionContainer {
    #[serde(rename = "totalSize")]
    pub total_size: i64,
}

/// XML device listing from `https://plex.tv/api/resources`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceList {
    #[serde(rename = "Device")]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Device {
    #[serde(rename = "@name")]
    pub name: String,
    /// Comma-separated list of roles, e.g. `server` or `client,player`.
    #[serde(rename = "@provides")]
    pub provides: String,
    #[serde(rename = "@owned", deserialize_with = "flag")]
    pub owned: bool,
    #[serde(rename = "@accessToken")]
    pub access_token: String,
    #[serde(rename = "Connection")]
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Connection {
    #[serde(rename = "@uri")]
    pub uri: String,
}

impl Device {
    pub fn is_owned_server(&self) -> bool {
        self.owned && self.provides.split(',').any(|role| role == "server")
    }
}

/// Plex encodes booleans as `0`/`1` in XML attributes.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    Ok(matches!(value.as_str(), "1" | "true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_server_info() {
        let body = r#"{
            "MediaContainer": {
                "machineIdentifier": "abc123",
                "friendlyName": "office",
                "version": "1.41.0.8992",
                "platform": "Linux",
                "size": 1
            }
        }"#;
        let response: ServerInfoResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.media_container.id, "abc123");
        assert_eq!(response.media_container.name, "office");
        assert_eq!(response.media_container.version, "1.41.0.8992");
        assert_eq!(response.media_container.platform, "Linux");
    }

    #[test]
    fn decodes_session_list() {
        let body = r#"{
            "MediaContainer": {
                "size": 1,
                "Metadata": [
                    {
                        "Session": { "bandwidth": 1500, "location": "lan" },
                        "Player": {
                            "device": "Windows",
                            "platform": "Chrome",
                            "profile": "Web",
                            "state": "playing",
                            "local": true,
                            "relayed": false,
                            "secure": true
                        }
                    }
                ]
            }
        }"#;
        let response: SessionList = serde_json::from_str(body).unwrap();
        let container = response.media_container;
        assert_eq!(container.size, 1);
        assert_eq!(container.metadata.len(), 1);
        assert_eq!(container.metadata[0].session.bandwidth, 1500);
        assert_eq!(container.metadata[0].player.device, "Windows");
        assert!(container.metadata[0].player.local);
    }

    #[test]
    fn empty_session_list_has_no_metadata() {
        let body = r#"{ "MediaContainer": { "size": 0 } }"#;
        let response: SessionList = serde_json::from_str(body).unwrap();
        assert_eq!(response.media_container.size, 0);
        assert!(response.media_container.metadata.is_empty());
    }

    #[test]
    fn decodes_library_sections() {
        let body = r#"{
            "MediaContainer": {
                "Directory": [
                    { "key": "1", "title": "Movies", "type": "movie" },
                    { "key": "2", "title": "Shows", "type": "show" }
                ]
            }
        }"#;
        let response: LibraryResponse = serde_json::from_str(body).unwrap();
        let sections = response.media_container.sections;
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].id, "1");
        assert_eq!(sections[0].name, "Movies");
        assert_eq!(sections[1].kind, "show");
    }

    #[test]
    fn decodes_section_total_size() {
        let body = r#"{ "MediaContainer": { "totalSize": 120, "size": 0 } }"#;
        let response: SectionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.media_container.total_size, 120);
    }

    #[test]
    fn decodes_device_list_xml() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
            <MediaContainer size="2">
                <Device name="office" provides="server" owned="1" accessToken="abc123">
                    <Connection protocol="https" uri="https://10-0-0-2.example.plex.direct:32400"/>
                    <Connection protocol="http" uri="http://10.0.0.2:32400"/>
                </Device>
                <Device name="phone" provides="client,player" owned="1" accessToken="xyz"/>
            </MediaContainer>"#;
        let list: DeviceList = quick_xml::de::from_str(body).unwrap();
        assert_eq!(list.devices.len(), 2);

        let server = &list.devices[0];
        assert!(server.is_owned_server());
        assert_eq!(server.access_token, "abc123");
        assert_eq!(server.connections.len(), 2);
        assert_eq!(server.connections[0].uri, "https://10-0-0-2.example.plex.direct:32400");

        // `player` devices provide no server role.
        assert!(!list.devices[1].is_owned_server());
        assert!(list.devices[1].connections.is_empty());
    }
}
