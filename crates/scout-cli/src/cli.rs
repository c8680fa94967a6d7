use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use scout_core::models::{AutoClimb, ClimbResult};
use scout_core::picklist::MoveDirection;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Offline-first match scouting from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (defaults to SCOUT_API_URL, then http://127.0.0.1:3001)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Directory holding the local cache and pending queue
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record and manage match entries
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Record and view pit scouting
    Pit {
        #[command(subcommand)]
        command: PitCommands,
    },
    /// Arrange the alliance-selection picklist
    Picklist {
        #[command(subcommand)]
        command: Option<PicklistCommands>,
    },
    /// Show team statistics
    Stats {
        /// Only this team
        #[arg(long)]
        team: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Push queued records to the backend
    Sync,
    /// Show pending queue status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the active event key
    Event {
        #[command(subcommand)]
        command: Option<EventCommands>,
    },
    /// Show or set the scout name attached to new entries
    ScoutName {
        /// New display name
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Scout a match
    #[command(alias = "new")]
    Add(EntryArgs),
    /// List entries, newest first
    List {
        /// Only entries for this team
        #[arg(long)]
        team: Option<u32>,
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete entries by id (admin)
    Delete {
        /// Entry ids
        #[arg(required = true)]
        ids: Vec<String>,
        /// Admin password
        #[arg(long)]
        password: String,
    },
    /// Delete every entry of the given teams (admin)
    DeleteTeam {
        /// Team numbers
        #[arg(required = true)]
        teams: Vec<u32>,
        /// Admin password
        #[arg(long)]
        password: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct EntryArgs {
    /// Team number
    #[arg(long)]
    pub team: u32,
    /// Match number
    #[arg(long = "match", value_name = "NUMBER")]
    pub match_number: u32,
    /// Event key (defaults to the active event)
    #[arg(long)]
    pub event: Option<String>,
    /// Scout name (defaults to the saved scout name)
    #[arg(long)]
    pub scout: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub auto_cycles: u32,
    /// Robot started with a preload
    #[arg(long)]
    pub preload: bool,
    /// Preload was scored
    #[arg(long)]
    pub preload_scored: bool,
    #[arg(long, default_value_t = 0.0)]
    pub auto_cycle_size: f64,
    #[arg(long, value_enum, default_value_t = AutoClimbArg::None)]
    pub auto_climb: AutoClimbArg,

    #[arg(long, default_value_t = 0)]
    pub teleop_cycles: u32,
    #[arg(long, default_value_t = 0.0)]
    pub cycle_size: f64,
    /// Defense effectiveness 1-5; omit when no defense was played
    #[arg(long, value_name = "RATING")]
    pub defense: Option<u8>,

    #[arg(long, value_enum, default_value_t = ClimbArg::None)]
    pub climb: ClimbArg,
    #[arg(long, default_value_t = 3)]
    pub climb_stability: u8,
    #[arg(long, default_value_t = 3)]
    pub driver_skill: u8,
    #[arg(long, default_value_t = 3)]
    pub speed: u8,
    #[arg(long, default_value_t = 3)]
    pub reliability: u8,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum AutoClimbArg {
    None,
    Side,
    Middle,
}

impl From<AutoClimbArg> for AutoClimb {
    fn from(value: AutoClimbArg) -> Self {
        match value {
            AutoClimbArg::None => Self::None,
            AutoClimbArg::Side => Self::Side,
            AutoClimbArg::Middle => Self::Middle,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ClimbArg {
    None,
    Attempted,
    Low,
    Mid,
    High,
}

impl From<ClimbArg> for ClimbResult {
    fn from(value: ClimbArg) -> Self {
        match value {
            ClimbArg::None => Self::None,
            ClimbArg::Attempted => Self::Attempted,
            ClimbArg::Low => Self::Low,
            ClimbArg::Mid => Self::Mid,
            ClimbArg::High => Self::High,
        }
    }
}

#[derive(Subcommand)]
pub enum PitCommands {
    /// Record a team's robot capabilities
    Add(PitArgs),
    /// Show the pit entry for one team
    Show {
        team: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all pit entries
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PitArgs {
    #[arg(long)]
    pub team: u32,
    /// Event key (defaults to the active event)
    #[arg(long)]
    pub event: Option<String>,
    #[arg(long)]
    pub scout: Option<String>,
    /// Robot can climb in autonomous
    #[arg(long)]
    pub auto_climb: bool,
    /// Highest endgame climb level
    #[arg(long, default_value = "")]
    pub robot_climb: String,
    #[arg(long, default_value_t = 0.0)]
    pub avg_balls: f64,
    #[arg(long, default_value_t = 0)]
    pub max_balls: u32,
    #[arg(long)]
    pub under_trench: bool,
    #[arg(long)]
    pub over_bump: bool,
    #[arg(long, default_value = "")]
    pub intake: String,
    #[arg(long, default_value = "none")]
    pub shooter: String,
}

#[derive(Subcommand)]
pub enum PicklistCommands {
    /// Show the picklist with team scores
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rebuild the picklist from statistics, dropping manual moves
    Reset,
    /// Move a team one place
    Move {
        team: u32,
        #[arg(value_enum)]
        direction: DirectionArg,
    },
    /// Append a team at the end
    Add { team: u32 },
    /// Remove a team (admin)
    Remove {
        team: u32,
        /// Admin password
        #[arg(long)]
        password: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for MoveDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Up => Self::Up,
            DirectionArg::Down => Self::Down,
        }
    }
}

#[derive(Subcommand)]
pub enum EventCommands {
    /// Show the active event key
    Show,
    /// Change the active event key (admin)
    Set {
        key: String,
        /// Admin password
        #[arg(long)]
        password: String,
    },
}
