//! Built-in rule catalog.
//!
//! The demo catalog the bot ships with. Deployments usually replace it with a
//! manifest, but it doubles as a worked example of the rule DSL.

use crate::collaborator::GitRef;
use crate::condition as c;
use crate::error::ConfigurationError;
use crate::requirement as r;
use crate::rules::{AutomaticCheck, ManualCheck, RuleSet};

pub fn demo_rules() -> Result<RuleSet, ConfigurationError> {
    let automatic = vec![
        AutomaticCheck::new(
            "Changes on 'foo' file should be reviewed by at least one [Bot PR](https://github.com/gnolang/gno/pull/3037) reviewer",
            c::and([
                c::base_branch("main"),
                c::or([
                    c::file_changed("foo")?,
                    c::file_changed("bar")?,
                    c::file_changed("baz")?,
                ]),
            ]),
            r::and([
                r::author("aeddi"),
                r::or([r::review_by_user("ltzmaxwell"), r::review_by_user("zivkovicmilos")]),
            ]),
        ),
        AutomaticCheck::new(
            "Maintainer must be able to edit this pull request",
            c::always(),
            r::maintainer_can_modify(),
        ),
        // Observe only; see EngineConfig::update_remediation.
        AutomaticCheck::new(
            "Pull request head branch must be up to date with its base",
            c::always(),
            r::up_to_date_with(GitRef::PullRequestBase),
        ),
        AutomaticCheck::new(
            "Label bug is applied for no other reason than testing",
            c::head_branch("demo-pr"),
            r::label("bug"),
        ),
    ];

    let infra_paths = || -> Result<Vec<c::Condition>, ConfigurationError> {
        Ok(vec![
            c::file_changed("misc/deployments")?,
            c::file_changed(r"misc/docker-\.*")?,
            c::file_changed("tm2/pkg/p2p")?,
        ])
    };

    let mut detailed_paths = infra_paths()?;
    detailed_paths.push(c::file_changed("contribs")?);

    let manual = vec![
        // Shipped without reviewers; a manual check must name a team, so this
        // one is routed to tech-staff.
        ManualCheck::new("Demo manual check", c::always(), ["tech-staff"]),
        ManualCheck::new(
            "Demo manual check with lot of (useless) details",
            c::or([
                c::always(),
                c::and([c::label("bug"), c::base_branch("main"), c::or(detailed_paths)]),
            ]),
            ["foo", "bar", "baz"],
        ),
        ManualCheck::new(
            "Determine if infra needs to be updated",
            c::and([c::base_branch("main"), c::or(infra_paths()?)]),
            ["tech-staff"],
        ),
        ManualCheck::new(
            "The code style is satisfactory",
            c::and([
                c::base_branch("main"),
                c::or([c::file_changed(r".*\.go")?, c::file_changed(r".*\.js")?]),
            ]),
            ["tech-staff"],
        ),
        ManualCheck::new(
            "The documentation is accurate and relevant",
            c::file_changed(r".*\.md")?,
            ["tech-staff", "devrels"],
        ),
    ];

    RuleSet::new(automatic, manual)
}
