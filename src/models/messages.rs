use serde::{Deserialize, Serialize};

use crate::core::{Cell, PublicPlayer};

/// Messages pushed from the server to a player
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage<'a> {
    /// Sent once when a connection joins
    PlayerInfo {
        id: &'a str,
        #[serde(rename = "profileImage")]
        profile_image: &'a str,
    },
    /// Board snapshot, countdown and public roster
    BoardUpdate {
        board: &'a [Cell],
        #[serde(rename = "timeLeft")]
        time_left: u64,
        players: Vec<PublicPlayer<'a>>,
    },
    /// Round result
    Winner {
        winner: Option<&'a str>,
        #[serde(rename = "winningCell", skip_serializing_if = "Option::is_none")]
        winning_cell: Option<usize>,
    },
    /// The same identity connected again somewhere else
    LoggedInElsewhere {},
}

/// Messages a player may send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Move(MoveRequest),
}

/// Claim request for one cell
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoveRequest {
    pub index: usize,
    #[serde(rename = "playerId")]
    pub player_id: String,
}

impl ClientMessage {
    /// Parse a text frame
    ///
    /// # Returns
    ///
    /// The message, or None for anything that is not a well-formed
    /// message of a known kind
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_info_shape() {
        let message = ServerMessage::PlayerInfo {
            id: "alice",
            profile_image: "/img/a.png",
        };

        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["type"], "playerInfo");
        assert_eq!(json["id"], "alice");
        assert_eq!(json["profileImage"], "/img/a.png");
    }

    #[test]
    fn test_board_update_shape() {
        let board = vec![Cell::Empty, Cell::Owned("alice".to_string()), Cell::Winner];
        let players = vec![PublicPlayer {
            id: "alice",
            profile_image: "/img/a.png",
        }];
        let message = ServerMessage::BoardUpdate {
            board: &board,
            time_left: 42,
            players,
        };

        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["type"], "boardUpdate");
        assert_eq!(json["board"], serde_json::json!([null, "alice", "winner"]));
        assert_eq!(json["timeLeft"], 42);
        assert_eq!(json["players"][0]["profileImage"], "/img/a.png");
    }

    #[test]
    fn test_winner_shape() {
        let with_winner = ServerMessage::Winner {
            winner: Some("bob"),
            winning_cell: Some(5),
        };
        let json = serde_json::to_value(&with_winner).unwrap();
        assert_eq!(json["type"], "winner");
        assert_eq!(json["winner"], "bob");
        assert_eq!(json["winningCell"], 5);

        let nobody = ServerMessage::Winner {
            winner: None,
            winning_cell: None,
        };
        let json = serde_json::to_value(&nobody).unwrap();
        assert!(json["winner"].is_null());
        assert!(json.get("winningCell").is_none());
    }

    #[test]
    fn test_logged_in_elsewhere_shape() {
        let json = serde_json::to_string(&ServerMessage::LoggedInElsewhere {}).unwrap();
        assert_eq!(json, r#"{"type":"loggedInElsewhere"}"#);
    }

    #[test]
    fn test_parse_move() {
        let parsed = ClientMessage::parse(r#"{"type":"move","index":5,"playerId":"alice"}"#);

        assert_eq!(
            parsed,
            Some(ClientMessage::Move(MoveRequest {
                index: 5,
                player_id: "alice".to_string(),
            }))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_moves() {
        assert!(ClientMessage::parse(r#"{"type":"move","index":-1,"playerId":"a"}"#).is_none());
        assert!(ClientMessage::parse(r#"{"type":"move","index":"3","playerId":"a"}"#).is_none());
        assert!(ClientMessage::parse(r#"{"type":"move","index":3}"#).is_none());
        assert!(ClientMessage::parse(r#"{"type":"teleport","index":3}"#).is_none());
        assert!(ClientMessage::parse("ping").is_none());
    }
}
