use serde::Serialize;

use super::{rank, Member, Tourney};

/// Public serialization of a member. Starting trophies are pinned at zero;
/// the current count is whatever the score feed last reported.
#[derive(Clone, Debug, Serialize)]
pub struct MemberView {
    pub user_id: String,
    #[serde(rename = "cpUserId")]
    pub cp_user_id: String,
    pub name: String,
    pub tag: String,
    #[serde(rename = "startTrophies")]
    pub start_trophies: i32,
    #[serde(rename = "currentTrophies")]
    pub current_trophies: i32,
    pub alias_id: String,
    pub wallet_public_key: String,
}

impl From<&Member> for MemberView {
    fn from(member: &Member) -> Self {
        Self {
            user_id: member.user_id.clone(),
            cp_user_id: member.user_id.clone(),
            name: member.name.clone(),
            tag: member.tag.clone(),
            start_trophies: 0,
            current_trophies: member.current_trophies,
            alias_id: member.alias_id.clone(),
            wallet_public_key: member.wallet_public_key.clone(),
        }
    }
}

/// Public serialization of a tourney, members sorted by trophies descending.
#[derive(Clone, Debug, Serialize)]
pub struct TourneyView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub prize: f64,
    pub transaction_id: String,
    pub user_id: String,
    pub members: Vec<MemberView>,
    pub members_count: usize,
    pub status: &'static str,
    pub last_modified: u64,
    pub link: String,
    #[serde(rename = "startAt")]
    pub start_at: u64,
    #[serde(rename = "endAt")]
    pub end_at: u64,
    pub payed: Option<u64>,
    pub ended: Option<u64>,
    pub prize_sent: Option<f64>,
    pub prize_sending_log: Option<String>,
    pub error_message: Option<String>,
}

impl TourneyView {
    /// `link_template` has its `{id}` placeholder substituted with the
    /// tourney id.
    pub fn build(tourney: &Tourney, link_template: &str) -> Self {
        Self {
            id: tourney.id.clone(),
            title: tourney.name.clone(),
            description: tourney.description.clone(),
            prize: tourney.prize,
            transaction_id: tourney.transaction_id.clone(),
            user_id: tourney.user_id.clone(),
            members: rank(&tourney.members)
                .into_iter()
                .map(MemberView::from)
                .collect(),
            members_count: tourney.members.len(),
            status: tourney.status.as_str(),
            last_modified: tourney.last_modified,
            link: link_template.replace("{id}", &tourney.id),
            start_at: tourney.start_at,
            end_at: tourney.end_at,
            payed: tourney.payed,
            ended: tourney.ended,
            prize_sent: tourney.prize_sent,
            prize_sending_log: tourney.prize_sending_log.clone(),
            error_message: tourney.error_message.clone(),
        }
    }
}
