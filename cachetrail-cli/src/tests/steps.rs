//! Behaviour-driven step definitions driving the recommend CLI scenarios.

use super::helpers::{
    FINDER, NEWCOMER, SeededDatabase, parse_output, recommended_ids, write_weights,
};
use super::*;
use cachetrail_scorer::{FactorWeightsError, RecommenderConfigError};
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct RecommendWorld {
    database: RefCell<Option<SeededDatabase>>,
    missing_path: RefCell<Option<Utf8PathBuf>>,
    user: RefCell<Option<u64>>,
    weights: RefCell<Option<(TempDir, Utf8PathBuf)>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl RecommendWorld {
    fn new() -> Self {
        Self {
            database: RefCell::new(None),
            missing_path: RefCell::new(None),
            user: RefCell::new(None),
            weights: RefCell::new(None),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn database_path(&self) -> Utf8PathBuf {
        if let Some(seeded) = self.database.borrow().as_ref() {
            return seeded.path.clone();
        }
        self.missing_path
            .borrow()
            .clone()
            .expect("a database path is configured")
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec![
            "cachetrail".to_owned(),
            "recommend".to_owned(),
            format!("--{ARG_DATABASE}"),
            self.database_path().into_string(),
        ];
        if let Some(user) = *self.user.borrow() {
            argv.extend([format!("--{ARG_USER}"), user.to_string()]);
        }
        if let Some((_, path)) = self.weights.borrow().as_ref() {
            argv.extend([format!("--{ARG_WEIGHTS}"), path.to_string()]);
        }
        argv
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> RecommendWorld {
    RecommendWorld::new()
}

#[given("a seeded cache database exists on disk")]
fn seeded_database_exists(#[from(world)] world: &RecommendWorld) {
    world.database.replace(Some(SeededDatabase::new()));
}

#[given("the cache database does not exist")]
fn database_does_not_exist(#[from(world)] world: &RecommendWorld) {
    world
        .missing_path
        .replace(Some(Utf8PathBuf::from("/nonexistent/cachetrail/caches.db")));
}

#[given("I ask for recommendations for the user with finds")]
fn ask_for_finder(#[from(world)] world: &RecommendWorld) {
    world.user.replace(Some(FINDER));
}

#[given("I ask for recommendations for a new user")]
fn ask_for_newcomer(#[from(world)] world: &RecommendWorld) {
    world.user.replace(Some(NEWCOMER));
}

#[given("the ranking weights give category a negative weight")]
fn negative_category_weight(#[from(world)] world: &RecommendWorld) {
    world.weights.replace(Some(write_weights(r#"{"factor_weights":{"category":-2.0}}"#)));
}

#[when("I run the recommend command")]
fn run_recommend_command(#[from(world)] world: &RecommendWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Recommend(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_recommend_with(args, &mut *buffer)
        }
        other => panic!("expected recommend command, found {other:?}"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds with personalised recommendations")]
fn command_succeeds_personalised(#[from(world)] world: &RecommendWorld) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    result.as_ref().expect("expected success");

    let payload = parse_output(&world.stdout.borrow());
    assert_eq!(payload["strategy"], "personalised");
    let ids = recommended_ids(&payload);
    assert_eq!(ids.last(), Some(&4), "distant puzzle ranks last");
}

#[then("the command succeeds with popular caches")]
fn command_succeeds_popular(#[from(world)] world: &RecommendWorld) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    result.as_ref().expect("expected success");

    let payload = parse_output(&world.stdout.borrow());
    assert_eq!(payload["strategy"], "popularity");
    assert_eq!(recommended_ids(&payload).first(), Some(&4));
}

#[then("the command fails because the database is missing")]
fn command_fails_missing_database(#[from(world)] world: &RecommendWorld) {
    match &*world.error() {
        CliError::MissingSourceFile { field, .. } => assert_eq!(*field, ARG_DATABASE),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[then("the command fails because the user is missing")]
fn command_fails_missing_user(#[from(world)] world: &RecommendWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, env } => {
            assert_eq!(*field, ARG_USER);
            assert_eq!(*env, ENV_RECOMMEND_USER);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[then("the command fails because the weights are invalid")]
fn command_fails_invalid_weights(#[from(world)] world: &RecommendWorld) {
    match &*world.error() {
        CliError::InvalidWeights(RecommenderConfigError::FactorWeights(
            FactorWeightsError::InvalidWeight { factor, .. },
        )) => assert_eq!(*factor, "category"),
        other => panic!("expected InvalidWeights, found {other:?}"),
    }
    assert!(world.stdout.borrow().is_empty());
}

macro_rules! register_recommend_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/recommend_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: RecommendWorld) {
            let _ = world;
        }
    };
}

register_recommend_scenario!(recommend_for_finder, "recommending caches for a user with finds");
register_recommend_scenario!(recommend_for_newcomer, "recommending caches for a new user");
register_recommend_scenario!(recommend_missing_database, "rejecting a missing database");
register_recommend_scenario!(recommend_missing_user, "rejecting a missing user");
register_recommend_scenario!(recommend_invalid_weights, "rejecting negative ranking weights");
