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

pub mod error_type;
pub mod lexicon;
pub mod outcome;
pub mod router;

pub use error_type::{infer as infer_error, ErrorType, ErrorVerdict, Severity};
pub use outcome::{classify_line, Outcome};
pub use router::{
    KeywordCountRouter, RoleRouter, RoutingDecision, RoutingStrategy, WeightedDomainRouter,
};
