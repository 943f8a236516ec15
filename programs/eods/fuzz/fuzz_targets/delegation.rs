#![no_main]

use anyhow::Result;
use arbitrary::Arbitrary;
use eods::prelude::*;
use fixed::types::I80F48;
use libfuzzer_sys::fuzz_target;
use test_utilities::actions::{ActionSequence, DelegationModel};

#[derive(Debug, Clone, Copy)]
pub struct OperatorStake(pub I80F48);

impl<'a> Arbitrary<'a> for OperatorStake {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(OperatorStake(I80F48::from_num(u.int_in_range(0..=128u32)?)))
    }
}

#[derive(Debug, Arbitrary)]
pub struct FuzzerContext {
    pub operator_stake: OperatorStake,
    pub strict_slashing: bool,
    pub action_sequence: ActionSequence,
}

fuzz_target!(|data: FuzzerContext| { process_actions(data).unwrap() });

fn process_actions(ctx: FuzzerContext) -> Result<()> {
    let mut config = DelegationConfig::default();
    config.configure(&DelegationConfigOpt {
        strict_slashing: Some(ctx.strict_slashing),
        ..Default::default()
    })?;

    let mut model = DelegationModel::new(ctx.operator_stake.0, config)?;
    model.run(&ctx.action_sequence)
}
