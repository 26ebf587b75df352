//! Property-based tests for verdict composition invariants.

use acap_common::BaselineFlags;
use acap_core::test_utils::{CallJournal, Script, ScriptedProbe};
use acap_core::{Decision, Engine};
use futures::executor::block_on;
use proptest::prelude::*;

/// A probe outcome as the generator sees it.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Pass,
    Negative,
    Errors,
    Panics,
}

impl Outcome {
    fn script(self) -> Script {
        match self {
            Outcome::Pass => Script::Resolve(true),
            Outcome::Negative => Script::Resolve(false),
            Outcome::Errors => Script::Fail("scripted failure".into()),
            Outcome::Panics => Script::Panic("scripted panic".into()),
        }
    }

    fn passes(self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

fn outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        6 => Just(Outcome::Pass),
        2 => Just(Outcome::Negative),
        1 => Just(Outcome::Errors),
        1 => Just(Outcome::Panics),
    ]
}

fn baseline_flags() -> impl Strategy<Value = BaselineFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(promises, typed_arrays, web_audio)| {
        BaselineFlags {
            promises,
            typed_arrays,
            web_audio,
        }
    })
}

struct Run {
    supported: bool,
    decision: Decision,
    journal: CallJournal,
}

fn run(flags: BaselineFlags, sync: &[Outcome], asyncs: &[Outcome]) -> Run {
    let journal = CallJournal::new();
    let mut builder = Engine::builder(flags);
    for (idx, outcome) in sync.iter().enumerate() {
        builder = builder.with_sync_probe(ScriptedProbe::new(format!("s{idx}"), outcome.script(), &journal));
    }
    for (idx, outcome) in asyncs.iter().enumerate() {
        builder = builder.with_async_probe(ScriptedProbe::new(format!("a{idx}"), outcome.script(), &journal));
    }
    let engine = builder.build();
    let verdict = block_on(engine.capability_token().verdict());
    Run {
        supported: verdict.supported,
        decision: verdict.decision.clone(),
        journal,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn verdict_is_and_of_every_stage(
        flags in baseline_flags(),
        sync in prop::collection::vec(outcome(), 0..4),
        asyncs in prop::collection::vec(outcome(), 0..4),
    ) {
        let expected = flags.all()
            && sync.iter().all(|o| o.passes())
            && asyncs.iter().all(|o| o.passes());
        let run = run(flags, &sync, &asyncs);
        prop_assert_eq!(run.supported, expected);
        prop_assert_eq!(run.decision == Decision::Supported, expected);
    }

    #[test]
    fn probes_run_at_most_once_and_only_when_reached(
        flags in baseline_flags(),
        sync in prop::collection::vec(outcome(), 0..4),
        asyncs in prop::collection::vec(outcome(), 0..4),
    ) {
        let run = run(flags, &sync, &asyncs);

        let reached_sync = if flags.all() {
            sync.iter().position(|o| !o.passes()).map_or(sync.len(), |first_bad| first_bad + 1)
        } else {
            0
        };
        let async_launched = flags.all() && sync.iter().all(|o| o.passes());

        for idx in 0..sync.len() {
            let expected = usize::from(idx < reached_sync);
            prop_assert_eq!(run.journal.invocations(&format!("s{idx}")), expected);
        }
        for idx in 0..asyncs.len() {
            let expected = usize::from(async_launched);
            prop_assert_eq!(run.journal.invocations(&format!("a{idx}")), expected);
        }
    }
}
