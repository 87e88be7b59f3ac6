use log::debug;
use std::collections::HashMap;

use crate::framework::core::DecodedPayload;

/// Logical application events raised for the game's API surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiEvent {
    InitializeGame,
    GetPlayerBaseData,
    GetBaseData,
    GetFleet,
    GetFleetData,
    GetMaterial,
    GetSlotItems,
    FleetCombined,
    LoadFleetPreset,
    ResupplyShip,
    StartRepair,
    StartSortie,
    GetSortieConditions,
    NextSortieNode,
    SortieStage,
    CombinedBattleWaterPhase,
    FinishedSortie,
    GetPvpOpponentList,
    GetOpponentInfo,
    StartPvpBattle,
    StartPvpNightBattle,
    FinishedPractice,
    GetMissionList,
    StartMission,
    CompleteMission,
    QuitMission,
    GetConstructionDocks,
    CraftItem,
    DestroyItem,
    CraftShip,
    DestroyShip,
    GetShip,
    GetQuestList,
    StartQuest,
    StopQuest,
    CompleteQuest,
}

impl ApiEvent {
    pub const ALL: &'static [ApiEvent] = &[
        ApiEvent::InitializeGame,
        ApiEvent::GetPlayerBaseData,
        ApiEvent::GetBaseData,
        ApiEvent::GetFleet,
        ApiEvent::GetFleetData,
        ApiEvent::GetMaterial,
        ApiEvent::GetSlotItems,
        ApiEvent::FleetCombined,
        ApiEvent::LoadFleetPreset,
        ApiEvent::ResupplyShip,
        ApiEvent::StartRepair,
        ApiEvent::StartSortie,
        ApiEvent::GetSortieConditions,
        ApiEvent::NextSortieNode,
        ApiEvent::SortieStage,
        ApiEvent::CombinedBattleWaterPhase,
        ApiEvent::FinishedSortie,
        ApiEvent::GetPvpOpponentList,
        ApiEvent::GetOpponentInfo,
        ApiEvent::StartPvpBattle,
        ApiEvent::StartPvpNightBattle,
        ApiEvent::FinishedPractice,
        ApiEvent::GetMissionList,
        ApiEvent::StartMission,
        ApiEvent::CompleteMission,
        ApiEvent::QuitMission,
        ApiEvent::GetConstructionDocks,
        ApiEvent::CraftItem,
        ApiEvent::DestroyItem,
        ApiEvent::CraftShip,
        ApiEvent::DestroyShip,
        ApiEvent::GetShip,
        ApiEvent::GetQuestList,
        ApiEvent::StartQuest,
        ApiEvent::StopQuest,
        ApiEvent::CompleteQuest,
    ];

    /// The exact request path this event is raised for.
    pub fn path(self) -> &'static str {
        match self {
            ApiEvent::InitializeGame => "/api_start2",
            ApiEvent::GetPlayerBaseData => "/api_get_member/require_info",
            ApiEvent::GetBaseData => "/api_port/port",
            ApiEvent::GetFleet => "/api_get_member/ship_deck",
            ApiEvent::GetFleetData => "/api_get_member/deck",
            ApiEvent::GetMaterial => "/api_get_member/material",
            ApiEvent::GetSlotItems => "/api_get_member/slotitem",
            ApiEvent::FleetCombined => "/api_req_hensei/combined",
            ApiEvent::LoadFleetPreset => "/api_req_hensei/preset_select",
            ApiEvent::ResupplyShip => "/api_req_hokyu/charge",
            ApiEvent::StartRepair => "/api_req_nyukyo/start",
            ApiEvent::StartSortie => "/api_req_map/start",
            ApiEvent::GetSortieConditions => "/api_get_member/sortie_conditions",
            ApiEvent::NextSortieNode => "/api_req_map/next",
            ApiEvent::SortieStage => "/api_req_sortie/battle",
            ApiEvent::CombinedBattleWaterPhase => "/api_req_combined_battle/battle_water",
            ApiEvent::FinishedSortie => "/api_req_sortie/battleresult",
            ApiEvent::GetPvpOpponentList => "/api_get_member/practice",
            ApiEvent::GetOpponentInfo => "/api_req_member/get_practice_enemyinfo",
            ApiEvent::StartPvpBattle => "/api_req_practice/battle",
            ApiEvent::StartPvpNightBattle => "/api_req_practice/midnight_battle",
            ApiEvent::FinishedPractice => "/api_req_practice/battle_result",
            ApiEvent::GetMissionList => "/api_get_member/mission",
            ApiEvent::StartMission => "/api_req_mission/start",
            ApiEvent::CompleteMission => "/api_req_mission/result",
            ApiEvent::QuitMission => "/api_req_mission/return_instruction",
            ApiEvent::GetConstructionDocks => "/api_get_member/kdock",
            ApiEvent::CraftItem => "/api_req_kousyou/createitem",
            ApiEvent::DestroyItem => "/api_req_kousyou/destroyitem2",
            ApiEvent::CraftShip => "/api_req_kousyou/createship",
            ApiEvent::DestroyShip => "/api_req_kousyou/destroyship",
            ApiEvent::GetShip => "/api_req_kousyou/getship",
            ApiEvent::GetQuestList => "/api_get_member/questlist",
            ApiEvent::StartQuest => "/api_req_quest/start",
            ApiEvent::StopQuest => "/api_req_quest/stop",
            ApiEvent::CompleteQuest => "/api_req_quest/clearitemget",
        }
    }

    /// Exact-match lookup of a normalized request path against the fixed
    /// path table. Anything not in the table resolves to `None`.
    pub fn from_path(path: &str) -> Option<ApiEvent> {
        Self::ALL.iter().copied().find(|event| event.path() == path)
    }
}

/// Application-supplied callback receiving the decoded payload for one event.
pub type ApiHandler = Box<dyn Fn(&DecodedPayload) + Send + Sync>;

/// Registry of handlers keyed by logical event.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ApiEvent, ApiHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any previous one for the same event.
    pub fn on<F>(&mut self, event: ApiEvent, handler: F)
    where
        F: Fn(&DecodedPayload) + Send + Sync + 'static,
    {
        if self.handlers.insert(event, Box::new(handler)).is_some() {
            debug!("replaced handler for {:?}", event);
        }
    }

    pub fn get(&self, event: ApiEvent) -> Option<&ApiHandler> {
        self.handlers.get(&event)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::core::ParseError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_from_path_exact_match() {
        assert_eq!(
            ApiEvent::from_path("/api_start2"),
            Some(ApiEvent::InitializeGame)
        );
        assert_eq!(
            ApiEvent::from_path("/api_port/port"),
            Some(ApiEvent::GetBaseData)
        );
        assert_eq!(ApiEvent::from_path("/unknown/path"), None);
    }

    #[test]
    fn test_from_path_rejects_near_matches() {
        // Prefixes and suffixes of known paths must not resolve.
        assert_eq!(ApiEvent::from_path("/api_start"), None);
        assert_eq!(ApiEvent::from_path("/api_start2/extra"), None);
        assert_eq!(ApiEvent::from_path("/api_req_quest/start2"), None);
    }

    #[test]
    fn test_every_event_round_trips_through_its_path() {
        for &event in ApiEvent::ALL {
            assert_eq!(ApiEvent::from_path(event.path()), Some(event));
        }
    }

    #[test]
    fn test_registry_registration_and_lookup() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        registry.on(ApiEvent::InitializeGame, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(registry.len(), 1);
        assert!(registry.get(ApiEvent::GetBaseData).is_none());

        let payload = DecodedPayload {
            body: Ok(json!({ "api_result": 1 })),
            post_body: Err(ParseError::MissingBody),
            request: json!({}),
            response: json!({}),
        };
        registry.get(ApiEvent::InitializeGame).unwrap()(&payload);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registry_replaces_existing_handler() {
        let mut registry = HandlerRegistry::new();
        registry.on(ApiEvent::GetMaterial, |_| {});
        registry.on(ApiEvent::GetMaterial, |_| {});
        assert_eq!(registry.len(), 1);
    }
}
