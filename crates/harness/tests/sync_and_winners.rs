use stagequest_core::{Environment, PrizeTier, Stage, Step};
use stagequest_engine::{build_leaderboard, Celebration, SyncStatus};
use stagequest_harness::{InMemoryBackend, SharedBackend, TestPlayer};

fn stage(n: u8) -> Stage {
    Stage::new(n).unwrap()
}

fn open_backend() -> SharedBackend {
    let mut backend = InMemoryBackend::new();
    backend.seed_default_answers();
    backend.enable_all_stages(Environment::Dev);
    SharedBackend::new(backend)
}

// ============================================================================
// Local-first writes and reconciliation
// ============================================================================

#[test]
fn solve_survives_a_ledger_outage() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut player = TestPlayer::new(&backend, "offline")?;

    backend.with_mut(|b| b.ledger_down = true);
    let outcome = player.solve_stage(stage(1))?;

    // Progression advanced locally even though nothing reached the backend.
    assert_eq!(outcome.sync, SyncStatus::PendingReconcile);
    assert!(player.engine.session().solved().contains(stage(1)));
    assert_eq!(player.engine.compute_current_stage(), stage(2));
    assert_eq!(backend.with(|b| b.solves().len()), 0);
    Ok(())
}

#[test]
fn reconcile_pushes_missing_solves_once_the_ledger_returns(
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut player = TestPlayer::new(&backend, "repair")?;

    backend.with_mut(|b| b.ledger_down = true);
    player.solve_stage(stage(1))?;
    player.solve_stage(stage(2))?;

    backend.with_mut(|b| b.ledger_down = false);
    let merged = player.engine.reconcile()?;

    assert!(merged.contains(stage(1)) && merged.contains(stage(2)));
    assert_eq!(backend.with(|b| b.solve_count(player.user_id(), stage(1))), 1);
    assert_eq!(backend.with(|b| b.solve_count(player.user_id(), stage(2))), 1);
    Ok(())
}

#[test]
fn reconcile_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut player = TestPlayer::new(&backend, "twice")?;
    player.solve_through(3)?;

    let first = player.engine.reconcile()?;
    let second = player.engine.reconcile()?;
    assert_eq!(first, second);

    // No duplicate ledger rows from the second pass.
    for n in 1..=3 {
        assert_eq!(backend.with(|b| b.solve_count(player.user_id(), stage(n))), 1);
    }
    Ok(())
}

#[test]
fn reconcile_unions_remote_and_local_views() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut player = TestPlayer::new(&backend, "union")?;

    // Stages 1 and 2 reach the ledger; stage 3 lands only locally.
    player.solve_through(2)?;
    backend.with_mut(|b| b.ledger_down = true);
    player.solve_stage(stage(3))?;
    backend.with_mut(|b| b.ledger_down = false);

    let merged = player.engine.reconcile()?;
    for n in 1..=3 {
        assert!(merged.contains(stage(n)));
    }
    assert_eq!(backend.with(|b| b.solve_count(player.user_id(), stage(3))), 1);
    Ok(())
}

#[test]
fn boot_restores_progress_recorded_on_another_device() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut first_device = TestPlayer::new(&backend, "roamer")?;
    first_device.solve_through(2)?;

    // Same account, fresh local cache.
    let mut second_device = TestPlayer::signed_in_as(&backend, first_device.profile.clone())?;
    second_device.engine.boot()?;

    assert!(second_device.engine.session().solved().contains(stage(1)));
    assert!(second_device.engine.session().solved().contains(stage(2)));
    assert_eq!(second_device.engine.compute_current_stage(), stage(3));
    Ok(())
}

#[test]
fn sign_out_clears_the_local_cache_but_not_the_ledger() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut player = TestPlayer::new(&backend, "leaver")?;
    player.solve_through(2)?;

    player.engine.sign_out()?;
    assert!(player.engine.session().solved().is_empty());
    assert_eq!(player.engine.session().current_stage(), stage(1));

    // The remote record is untouched and comes back on the next boot.
    player.engine.boot()?;
    assert!(player.engine.session().solved().contains(stage(2)));
    Ok(())
}

// ============================================================================
// Winner registration
// ============================================================================

#[test]
fn first_solver_takes_the_winner_slot() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut alice = TestPlayer::new(&backend, "alice")?;
    let mut bob = TestPlayer::new(&backend, "bob")?;

    let alice_outcome = alice.solve_stage(stage(1))?;
    let bob_outcome = bob.solve_stage(stage(1))?;

    assert!(alice_outcome.is_stage_winner);
    assert_eq!(alice_outcome.celebration, Celebration::StageWinner);
    assert!(!bob_outcome.is_stage_winner);
    assert_eq!(bob_outcome.celebration, Celebration::AlreadyWon);

    // Exactly one winner record, but both solves count for progression.
    let winner = backend.with(|b| b.winner(stage(1)).cloned());
    assert_eq!(winner.map(|w| w.user_id), Some(alice.user_id()));
    assert_eq!(backend.with(|b| b.solves().len()), 2);
    assert_eq!(bob.engine.compute_current_stage(), stage(2));
    Ok(())
}

#[test]
fn lost_claim_race_is_not_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut alice = TestPlayer::new(&backend, "alice")?;
    let mut bob = TestPlayer::new(&backend, "bob")?;
    alice.solve_stage(stage(1))?;

    // Bob's pre-claim probe sees a vacant slot, so his claim collides with
    // Alice's row inside the registrar.
    backend.with_mut(|b| b.stale_winner_check = true);
    let outcome = bob.solve_stage(stage(1))?;

    assert!(!outcome.is_stage_winner);
    assert_eq!(outcome.celebration, Celebration::AlreadyWon);
    let winner = backend.with(|b| b.winner(stage(1)).cloned());
    assert_eq!(winner.map(|w| w.user_id), Some(alice.user_id()));
    Ok(())
}

#[test]
fn registrar_outage_never_blocks_progression() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    backend.with_mut(|b| b.registrar_down = true);
    let mut player = TestPlayer::new(&backend, "unlucky")?;

    let outcome = player.solve_stage(stage(1))?;
    assert!(!outcome.is_stage_winner);
    assert!(player.engine.session().solved().contains(stage(1)));
    assert!(backend.with(|b| b.winner(stage(1)).is_none()));
    Ok(())
}

#[test]
fn finishing_the_last_stage_celebrates_mastery() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut runner_up = TestPlayer::new(&backend, "runnerup")?;
    let mut champion = TestPlayer::new(&backend, "champion")?;

    champion.solve_through(15)?;
    runner_up.solve_through(15)?;
    let outcome = champion.solve_stage(Stage::FINAL)?;

    // Mastery outranks the winner banner even though the slot was free.
    assert!(outcome.is_stage_winner);
    assert_eq!(outcome.celebration, Celebration::MasterStage);
    assert_eq!(outcome.next_stage, None);

    // The runner-up finishes too, mastery again, without the winner slot.
    let second = runner_up.solve_stage(Stage::FINAL)?;
    assert!(!second.is_stage_winner);
    assert_eq!(second.celebration, Celebration::MasterStage);
    Ok(())
}

#[test]
fn solve_records_carry_identity_and_final_step() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut player = TestPlayer::new(&backend, "scribe")?;
    player.solve_through(5)?;

    let solves = backend.with(|b| b.solves().to_vec());
    let record = solves
        .iter()
        .find(|s| s.stage == stage(5))
        .ok_or("stage 5 solve missing")?;
    assert_eq!(record.user_id, player.user_id());
    assert_eq!(record.username, "scribe");
    assert_eq!(record.email, "scribe@example.com");
    assert_eq!(record.step, Step::Two);
    assert!(record.solved_at > 0);
    Ok(())
}

// ============================================================================
// Leaderboard
// ============================================================================

#[test]
fn leaderboard_mixes_winners_and_placeholders() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut player = TestPlayer::new(&backend, "leader")?;
    player.solve_through(2)?;

    let mut handle = backend.clone();
    let rows = build_leaderboard(&mut handle);
    assert_eq!(rows.len(), Stage::COUNT as usize);

    assert_eq!(
        rows[0].winner.as_ref().map(|w| w.username.as_str()),
        Some("leader")
    );
    assert!(rows[0].winner.as_ref().is_some_and(|w| w.won_at > 0));
    assert!(rows[2].winner.is_none());

    // Prize tiers follow the stage ranges.
    assert_eq!(rows[0].prize, PrizeTier::CashAndGiftCard);
    assert_eq!(rows[14].prize, PrizeTier::MilesTierA);
    assert_eq!(rows[15].prize, PrizeTier::MilesTierB);
    Ok(())
}

#[test]
fn leaderboard_outage_degrades_to_placeholders() -> Result<(), Box<dyn std::error::Error>> {
    let backend = open_backend();
    let mut player = TestPlayer::new(&backend, "leader")?;
    player.solve_stage(stage(1))?;

    backend.with_mut(|b| b.registrar_down = true);
    let mut handle = backend.clone();
    let rows = build_leaderboard(&mut handle);
    assert_eq!(rows.len(), Stage::COUNT as usize);
    assert!(rows.iter().all(|r| r.winner.is_none()));
    Ok(())
}
