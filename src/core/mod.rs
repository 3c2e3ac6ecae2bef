// logtriage - GPL-3.0-or-later
// This file is part of logtriage.
//
// Copyright (C) 2025 The logtriage authors
//
// logtriage is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// logtriage is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with logtriage.  If not, see <https://www.gnu.org/licenses/>.


pub mod analyzer;
pub mod state;
pub mod status;
pub mod summary;

pub use analyzer::{Analyzer, Classification, DeveloperMapping, InputError};
pub use state::{SharedState, TicketRecord};
pub use status::{Health, StatusReport};
pub use summary::{AnalysisRecord, RunSummary};
