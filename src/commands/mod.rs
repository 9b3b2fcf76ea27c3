//! Chat command surface
//!
//! A chat line such as `dice add coin heads,tails` is parsed with clap and
//! executed for one user id. Every outcome, including errors, is rendered
//! to an English reply; nothing here panics on bad input.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, error};

use crate::dice::FaceOptions;
use crate::error::{DiceError, DiceResult};
use crate::service::Services;

/// A parsed chat command
#[derive(Debug, Parser)]
#[command(name = "md", no_binary_name = true, disable_version_flag = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create your default dice group
    Init,
    /// Roll a dice: [group:]dice [times]
    Roll {
        input: String,
        #[arg(allow_negative_numbers = true)]
        times: Option<i64>,
        /// Never draw the same top-level face twice in one batch
        #[arg(short = 'w', long = "without-replacement")]
        without_replacement: bool,
    },
    /// Manage dice groups
    #[command(subcommand)]
    Group(GroupCommand),
    /// Manage dice
    #[command(subcommand)]
    Dice(DiceCommand),
    /// Manage ingestion tokens
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    Add {
        name: String,
    },
    Rename {
        input: String,
        new_name: String,
    },
    Delete {
        input: String,
    },
    /// 0 makes the group private, anything else public
    #[command(name = "setpublic")]
    SetPublic {
        input: String,
        #[arg(allow_negative_numbers = true)]
        is_public: i64,
    },
    Clone {
        input: String,
        new_name: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum DiceCommand {
    Add {
        name: String,
        #[command(flatten)]
        options: FaceArgs,
        /// Face spec; the remaining words are joined with spaces
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        faces: Vec<String>,
    },
    Set {
        input: String,
        #[command(flatten)]
        options: FaceArgs,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        faces: Vec<String>,
    },
    Delete {
        input: String,
    },
    Rename {
        input: String,
        new_name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Issue a token, optionally with a lifetime in seconds
    Add { expire: Option<i64> },
    /// Revoke all of your tokens
    Clear,
}

/// Face parsing flags shared by `dice add` and `dice set`
#[derive(Debug, Clone, Default, Args)]
pub struct FaceArgs {
    /// Target group
    #[arg(short = 'g', long)]
    pub group: Option<String>,
    /// Items are face objects
    #[arg(short = 'o', long)]
    pub object: bool,
    /// JSONPath selecting the items
    #[arg(short = 'j', long)]
    pub jsonpath: Option<String>,
}

impl From<FaceArgs> for FaceOptions {
    fn from(args: FaceArgs) -> Self {
        FaceOptions {
            group: args.group,
            object: args.object,
            jsonpath: args.jsonpath,
        }
    }
}

/// Parse a chat line into a command
pub fn parse_line(line: &str) -> Result<Command, clap::Error> {
    CommandLine::try_parse_from(line.split_whitespace()).map(|cli| cli.command)
}

/// Render a domain error as a reply; storage failures are logged, not shown
pub fn render_error(err: &DiceError) -> String {
    if err.is_user_error() {
        err.to_string()
    } else {
        error!("Command failed: {}", err);
        "An internal error occurred. Please try again later.".to_string()
    }
}

/// Executes commands against the services
#[derive(Clone)]
pub struct CommandRunner {
    services: Services,
}

impl CommandRunner {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Parse, execute and render one chat line
    pub async fn run_line(&self, line: &str, user_id: i64) -> String {
        match parse_line(line) {
            Ok(command) => self.run(command, user_id).await,
            Err(e) => e.to_string(),
        }
    }

    /// Execute and render one command
    pub async fn run(&self, command: Command, user_id: i64) -> String {
        debug!("User {} runs {:?}", user_id, command);
        match self.execute(command, user_id).await {
            Ok(reply) => reply,
            Err(e) => render_error(&e),
        }
    }

    /// Execute one command, returning the success reply
    pub async fn execute(&self, command: Command, user_id: i64) -> DiceResult<String> {
        match command {
            Command::Init => {
                let group = self.services.groups.init_group(user_id).await?;
                Ok(format!("Initialized your dice group \"{}\".", group.name))
            }
            Command::Roll {
                input,
                times,
                without_replacement,
            } => {
                let times = times.unwrap_or(1);
                let results = self
                    .services
                    .dices
                    .roll_dice(&input, user_id, times, without_replacement)
                    .await?;
                Ok(render_rolls(&input, &results))
            }
            Command::Group(command) => self.execute_group(command, user_id).await,
            Command::Dice(command) => self.execute_dice(command, user_id).await,
            Command::Token(command) => self.execute_token(command, user_id).await,
        }
    }

    async fn execute_group(&self, command: GroupCommand, user_id: i64) -> DiceResult<String> {
        let groups = &self.services.groups;
        match command {
            GroupCommand::Add { name } => {
                let group = groups.add_group(&name, user_id).await?;
                Ok(format!("Added group \"{}\" with ID {}.", name, group.id))
            }
            GroupCommand::Rename { input, new_name } => {
                let matched = groups.rename_group(&input, user_id, &new_name).await?;
                Ok(if matched > 0 {
                    format!("Renamed group \"{}\" to \"{}\".", input, new_name)
                } else {
                    format!("Group \"{}\" was not renamed.", input)
                })
            }
            GroupCommand::Delete { input } => {
                let matched = groups.delete_group(&input, user_id).await?;
                Ok(if matched > 0 {
                    format!("Deleted group \"{}\".", input)
                } else {
                    format!("Group \"{}\" was not deleted.", input)
                })
            }
            GroupCommand::SetPublic { input, is_public } => {
                let is_public = is_public != 0;
                let matched = groups.set_group_public(&input, user_id, is_public).await?;
                Ok(match (matched > 0, is_public) {
                    (true, true) => format!("Group \"{}\" is now public.", input),
                    (true, false) => format!("Group \"{}\" is now private.", input),
                    (false, _) => format!("Group \"{}\" was not changed.", input),
                })
            }
            GroupCommand::Clone { input, new_name } => {
                let group = groups.clone_group(&input, user_id, new_name.as_deref()).await?;
                Ok(format!("Cloned group \"{}\" as \"{}\".", input, group.name))
            }
        }
    }

    async fn execute_dice(&self, command: DiceCommand, user_id: i64) -> DiceResult<String> {
        let dices = &self.services.dices;
        match command {
            DiceCommand::Add {
                name,
                options,
                faces,
            } => {
                let dice = dices
                    .add_dice(&name, user_id, &faces.join(" "), &options.into())
                    .await?;
                Ok(format!("Added dice \"{}\" with ID {}.", name, dice.id))
            }
            DiceCommand::Set {
                input,
                options,
                faces,
            } => {
                let matched = dices
                    .set_dice_faces(&input, user_id, &faces.join(" "), &options.into())
                    .await?;
                Ok(if matched > 0 {
                    format!("Updated the faces of dice \"{}\".", input)
                } else {
                    format!("Dice \"{}\" was not updated.", input)
                })
            }
            DiceCommand::Delete { input } => {
                let matched = dices.delete_dice(&input, user_id).await?;
                Ok(if matched > 0 {
                    format!("Deleted dice \"{}\".", input)
                } else {
                    format!("Dice \"{}\" was not deleted.", input)
                })
            }
            DiceCommand::Rename { input, new_name } => {
                let matched = dices.rename_dice(&input, user_id, &new_name).await?;
                Ok(if matched > 0 {
                    format!("Renamed dice \"{}\" to \"{}\".", input, new_name)
                } else {
                    format!("Dice \"{}\" was not renamed.", input)
                })
            }
        }
    }

    async fn execute_token(&self, command: TokenCommand, user_id: i64) -> DiceResult<String> {
        let tokens = &self.services.tokens;
        match command {
            TokenCommand::Add { expire } => {
                let issued = tokens
                    .add_token(user_id, expire)
                    .await
                    .with_context(|| format!("failed to add token for user {}", user_id))?;
                Ok(format!(
                    "Your token: {}\nIt expires at {}.",
                    issued.secret,
                    issued.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
                ))
            }
            TokenCommand::Clear => {
                let cleared = tokens
                    .clear_tokens(user_id)
                    .await
                    .with_context(|| format!("failed to clear tokens for user {}", user_id))?;
                Ok(if cleared {
                    "All of your tokens have been revoked.".to_string()
                } else {
                    "You have no tokens to revoke.".to_string()
                })
            }
        }
    }
}

fn render_rolls(input: &str, results: &[String]) -> String {
    match results {
        [single] => format!("{} rolled: {}", input, single),
        _ => format!("Rolled {} times:\n{}", results.len(), results.join("\n")),
    }
}
