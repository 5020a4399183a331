fn main() {
    println!("Run `cargo test -p catalog-compat` to execute catalog compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use gameyfin_catalog::{GameMetadata, RemoteGame, games_from_json};
    use gameyfin_settings::ImportFilter;

    const BASE: &str = "https://games.example.com/";

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> Vec<u8> {
        let path = fixtures_dir().join(name);
        fs::read(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn import(filter: ImportFilter) -> Vec<GameMetadata> {
        games_from_json(&load_fixture("games.json"), BASE, &filter)
            .unwrap_or_else(|e| panic!("failed to import games.json: {e}"))
    }

    fn find<'a>(games: &'a [GameMetadata], id: &str) -> &'a GameMetadata {
        games
            .iter()
            .find(|g| g.game_id == id)
            .unwrap_or_else(|| panic!("{id} missing from import"))
    }

    // --- Response parsing ---

    #[test]
    fn fixture_parses_as_remote_games() {
        let games: Vec<RemoteGame> = serde_json::from_slice(&load_fixture("games.json")).unwrap();
        assert_eq!(games.len(), 4);

        let it_takes_two = &games[1];
        assert!(it_takes_two.summary.is_empty());
        assert!(it_takes_two.cover_id.is_empty());
        assert_eq!(it_takes_two.user_rating, None);
        assert!(it_takes_two.platforms.is_empty());
    }

    // --- Import ---

    #[test]
    fn unfiltered_import_drops_unconfirmed_matches() {
        let games = import(ImportFilter::default());
        let ids: Vec<_> = games.iter().map(|g| g.game_id.as_str()).collect();
        assert_eq!(ids, vec!["hollow-knight", "it-takes-two", "celeste"]);
    }

    #[test]
    fn platform_filter_keeps_matching_libraries() {
        let games = import(ImportFilter::new(["win"]));
        let ids: Vec<_> = games.iter().map(|g| g.game_id.as_str()).collect();
        assert_eq!(ids, vec!["hollow-knight", "it-takes-two"]);

        let games = import(ImportFilter::new(["switch", "ps5"]));
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].game_id, "celeste");
    }

    #[test]
    fn full_record_maps_every_field() {
        let games = import(ImportFilter::default());
        let hk = find(&games, "hollow-knight");

        assert_eq!(hk.source, "Gameyfin");
        assert_eq!(hk.name, "Hollow Knight");
        assert_eq!(hk.release_date.to_string(), "2017-02-24");
        assert_eq!(hk.user_score, Some(91));
        assert_eq!(hk.critic_score, Some(87));
        assert!(hk.genres.contains("Platform") && hk.genres.contains("Adventure"));
        assert!(hk.platforms.contains("PC (Microsoft Windows)"));
        assert!(hk.developers.contains("Team Cherry"));
        assert_eq!(hk.features.len(), 1);
        assert!(hk.features.contains("Side view"));
        assert_eq!(
            hk.cover_image.as_deref(),
            Some("https://games.example.com/v1/images/co93cr")
        );
        assert!(!hk.is_installed);

        assert_eq!(hk.game_actions.len(), 1);
        let action = &hk.game_actions[0];
        assert_eq!(action.name, "Download");
        assert!(!action.is_play_action);
        assert_eq!(
            action.path,
            "https://games.example.com/v1/games/game/hollow-knight/download"
        );
    }

    #[test]
    fn null_fields_map_to_empty_values() {
        let games = import(ImportFilter::default());
        let itt = find(&games, "it-takes-two");

        assert!(itt.description.is_empty());
        assert_eq!(itt.cover_image, None);
        assert_eq!(itt.user_score, None);
        assert_eq!(itt.release_date.to_string(), "2021-03-26");
        assert!(itt.features.contains("Online Co-Op"));
        assert!(itt.features.contains("Offline Co-Op"));
        assert!(!itt.features.contains("LAN Support"));
        assert_eq!(itt.developers.len(), 2);
    }

    #[test]
    fn offset_timestamp_keeps_local_date() {
        let games = import(ImportFilter::default());
        assert_eq!(find(&games, "celeste").release_date.to_string(), "2018-01-25");
    }

    // --- Serialized output ---

    #[test]
    fn metadata_serializes_camel_case() {
        let games = import(ImportFilter::new(["switch"]));
        let value = serde_json::to_value(&games[0]).unwrap();

        assert_eq!(value["gameId"], "celeste");
        assert_eq!(value["releaseDate"], "2018-01-25");
        assert_eq!(value["isInstalled"], false);
        assert_eq!(value["gameActions"][0]["actionType"], "Url");
        assert_eq!(value["gameActions"][0]["isPlayAction"], false);
    }

    #[test]
    fn missing_cover_is_omitted_from_output() {
        let games = import(ImportFilter::default());
        let value = serde_json::to_value(find(&games, "it-takes-two")).unwrap();
        assert!(value.get("coverImage").is_none());
    }
}
