//! The staleness decision: does a unit need recompiling?

use crate::depfile;
use crate::engine::unit::BuildUnit;
use crate::timestamp::TimestampCache;
use tracing::debug;

/// Decides whether `unit` must be recompiled
///
/// A unit needs compiling when its object or dependency file is missing,
/// or when any file named in its dependency record is newer than the
/// object. Failures along the way (unreadable dependency record, a listed
/// dependency that cannot be stat'ed) answer `true`: an unnecessary
/// recompilation is acceptable, silently skipping a stale unit is not.
///
/// Pure with respect to the cache's current snapshot; touching files
/// mid-run is only observed after [`TimestampCache::clear`].
pub fn needs_compile(unit: &BuildUnit, cache: &mut TimestampCache) -> bool {
    if !unit.object.exists() || !unit.depfile.exists() {
        return true;
    }

    let related = match depfile::read_related_files(&unit.depfile) {
        Ok(related) => related,
        Err(err) => {
            debug!(
                depfile = %unit.depfile.display(),
                error = %err,
                "dependency record unreadable, forcing recompilation"
            );
            return true;
        }
    };

    match cache.is_latest(&unit.object, &related) {
        Ok(object_is_latest) => !object_is_latest,
        Err(err) => {
            debug!(
                object = %unit.object.display(),
                error = %err,
                "timestamp unavailable, forcing recompilation"
            );
            true
        }
    }
}
