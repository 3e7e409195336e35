//! Deploy scripts and their selection by tag.
//!
//! Scripts run in declaration order. A script is selected when it carries one
//! of the requested tags, or when it provides a tag a selected script depends on.

mod fund_me;
mod mock_feed;

use std::future::Future;

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use derive_more::Deref;
use strum::IntoEnumIterator;

pub use fund_me::{FUND_ME, FundMeScript, fund_me_args};
pub use mock_feed::{MOCK_V3_AGGREGATOR, MockFeedScript, mock_feed_args};

use crate::{deployments::Deployments, network::Network, verify::Verifier};

/// Labels used to select deploy scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tag {
    All,
    Mocks,
    /// Spelled the way existing deploy commands use it; `fundme` is accepted too.
    #[strum(to_string = "fundmd", serialize = "fundme")]
    Fundmd,
}

/// What a deploy script has access to while it runs.
pub struct DeployContext<'a, D, V> {
    pub network: &'a Network,
    /// The `firstAccount` named account.
    pub first_account: Address,
    /// The `secondAccount` named account, when the network has one.
    pub second_account: Option<Address>,
    pub deployments: &'a mut D,
    pub verifier: &'a V,
}

/// A step of the deployment pipeline.
pub trait DeployScript: Send + Sync {
    const NAME: &'static str;
    const TAGS: &'static [Tag];
    /// Tags of the scripts that must run before this one.
    const DEPENDENCIES: &'static [Tag] = &[];

    fn run<D: Deployments, V: Verifier>(
        &self,
        ctx: &mut DeployContext<'_, D, V>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The deploy scripts of the project, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Script {
    #[strum(to_string = "00-deploy-mock")]
    MockFeed,
    #[strum(to_string = "01-deploy-fund-me")]
    FundMe,
}

impl Script {
    pub fn tags(self) -> &'static [Tag] {
        match self {
            Script::MockFeed => MockFeedScript::TAGS,
            Script::FundMe => FundMeScript::TAGS,
        }
    }

    pub fn dependencies(self) -> &'static [Tag] {
        match self {
            Script::MockFeed => MockFeedScript::DEPENDENCIES,
            Script::FundMe => FundMeScript::DEPENDENCIES,
        }
    }

    fn provides(self, tag: Tag) -> bool {
        self.tags().contains(&tag)
    }

    pub async fn run<D: Deployments, V: Verifier>(
        self,
        ctx: &mut DeployContext<'_, D, V>,
    ) -> Result<()> {
        match self {
            Script::MockFeed => MockFeedScript.run(ctx).await,
            Script::FundMe => FundMeScript.run(ctx).await,
        }
    }
}

/// Scripts selected for a run, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct ScriptPlan(Vec<Script>);

impl ScriptPlan {
    /// Select the scripts matching `tags` (all scripts when empty) along with
    /// the scripts they depend on.
    pub fn select(tags: &[Tag]) -> Self {
        let requested: &[Tag] = if tags.is_empty() { &[Tag::All] } else { tags };

        let mut selected: Vec<Script> = Script::iter()
            .filter(|script| requested.iter().any(|tag| script.provides(*tag)))
            .collect();

        loop {
            let missing: Vec<Script> = Script::iter()
                .filter(|candidate| !selected.contains(candidate))
                .filter(|candidate| {
                    selected.iter().any(|script| {
                        script
                            .dependencies()
                            .iter()
                            .any(|tag| candidate.provides(*tag))
                    })
                })
                .collect();

            if missing.is_empty() {
                break;
            }
            selected.extend(missing);
        }

        Self(Script::iter().filter(|s| selected.contains(s)).collect())
    }

    /// Run the scripts one after the other, stopping at the first failure.
    pub async fn run<D: Deployments, V: Verifier>(
        &self,
        ctx: &mut DeployContext<'_, D, V>,
    ) -> Result<()> {
        for script in self.iter() {
            tracing::debug!(script = %script, network = %ctx.network.name, "Running deploy script");
            script
                .run(ctx)
                .await
                .with_context(|| format!("Deploy script {} failed", script))?;
        }
        Ok(())
    }
}
