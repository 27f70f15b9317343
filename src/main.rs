use anyhow::{Context, Result};
use std::env;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meet_officials::{
    collect_feed_files, run_batch, BatchModel, ClubId, ReferenceCatalog, ScoringEngine,
};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meet_officials=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut as_json = false;
    let mut positional: Vec<String> = Vec::new();
    for arg in &args[1..] {
        if arg == "--json" {
            as_json = true;
        } else {
            positional.push(arg.clone());
        }
    }

    if positional.len() < 2 {
        eprintln!("Usage: meet-officials [--json] <catalog-dir> <feed file or directory>...");
        process::exit(2);
    }

    let catalog = ReferenceCatalog::from_dir(&positional[0])
        .with_context(|| format!("loading reference catalog from {}", positional[0]))?;
    let files = collect_feed_files(&positional[1..])?;
    let mut model = run_batch(&catalog, &files)?;

    let engine = ScoringEngine::new();
    if as_json {
        print_json(&mut model, &engine)?;
    } else {
        print_summary(&mut model, &engine);
    }

    Ok(())
}

/// Clubs involved in a session: everyone with a participation count or a
/// resolved official.
fn session_clubs(session: &meet_officials::Session) -> Vec<ClubId> {
    let mut clubs: Vec<ClubId> = session.participation.keys().copied().collect();
    for official in session.officials.values() {
        if !clubs.contains(&official.club_id) {
            clubs.push(official.club_id);
        }
    }
    clubs.sort();
    clubs
}

fn print_summary(model: &mut BatchModel, engine: &ScoringEngine) {
    let ids: Vec<u32> = model.reported().map(|c| c.id).collect();

    for id in ids {
        let competition = model.competitions.get_mut(&id).unwrap();
        println!("{}", competition);
        println!("{}", "-".repeat(60));

        for session_index in 0..competition.sessions.len() {
            let session_number = competition.sessions[session_index].number;
            println!("Session {}", session_number);

            let clubs = session_clubs(&competition.sessions[session_index]);
            for club_id in clubs {
                let score = engine.points(competition, session_index, club_id, true);
                let name = model
                    .clubs
                    .get(&club_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| format!("club {}", club_id));
                let participations =
                    competition.sessions[session_index].participation_of(club_id);
                println!(
                    "  {:<32} {:>3} participation(s)  {:>+4} pts",
                    name, participations, score.points
                );
                for line in score.rationale.unwrap_or_default() {
                    println!("      - {}", line);
                }
            }
        }
        println!();
    }
}

fn print_json(model: &mut BatchModel, engine: &ScoringEngine) -> Result<()> {
    let ids: Vec<u32> = model.reported().map(|c| c.id).collect();
    let mut competitions = Vec::new();

    for id in ids {
        let competition = model.competitions.get_mut(&id).unwrap();
        let mut sessions = Vec::new();

        for session_index in 0..competition.sessions.len() {
            let clubs = session_clubs(&competition.sessions[session_index]);
            let mut scores = serde_json::Map::new();
            for club_id in clubs {
                let score = engine.points(competition, session_index, club_id, true);
                scores.insert(club_id.to_string(), serde_json::to_value(&score)?);
            }
            let session = &competition.sessions[session_index];
            sessions.push(serde_json::json!({
                "number": session.number,
                "start": session.start,
                "participation": session.participation,
                "engagements": session.engagements,
                "entries": session.entries,
                "forfeits": session.forfeits,
                "scores": scores,
            }));
        }

        let competition = &model.competitions[&id];
        competitions.push(serde_json::json!({
            "id": competition.id,
            "name": competition.name,
            "city": competition.city,
            "dates": competition.date_str(),
            "level": competition.level.as_str(),
            "sessions": sessions,
        }));
    }

    let report = serde_json::json!({
        "clubs": model.clubs,
        "competitions": competitions,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
