/*!
Lightweight command dispatcher module.

Only module declarations + re-exports live here.

Directory Layout:
  src/cmd/
    mod.rs          (this file)
    show.rs         (ShowArgs + Mode + execute_show)
    fields.rs       (field classification + common-info projection)
    tabular.rs      (typed summary projection + report)
    format.rs       (tab-aligned column writer)
    output.rs       (OutputFormat + YAML/JSON serialization + writing)
    shared.rs       (Session: runtime + store client for blocking callers)

Conventions:
  - Each subcommand module exposes exactly one public `execute_*` function
    that returns `anyhow::Result<()>`.
  - Argument structs derive `clap::Args` and are kept minimal.
  - Store access goes through `shared::Session` so a command owns exactly
    one runtime and one cookie jar.
*/

pub mod fields;
pub mod format;
pub mod output;
pub mod shared;
pub mod show;
pub mod tabular;

pub use show::{ShowArgs, execute_show};
