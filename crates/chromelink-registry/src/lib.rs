// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chromelink Registry — bidirectional mapping between remote handles and
// host instances, with strong and weak ownership.

pub mod object;
pub mod registry;

pub use object::{AsAnyArc, HostObject, InstanceObserver};
pub use registry::InstanceRegistry;
