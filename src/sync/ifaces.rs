///
/// Common surface of every spinning lock in this crate.
///
/// Ownership is anonymous: the lock word is the only record of being held, so
/// any thread may release a lock acquired by any other thread. Calling
/// [`LockIface::unlock`] on a lock that is not held is a contract violation
/// which is not checked.
///
/// # Safety
/// Implementors must guarantee that a successful [`LockIface::try_lock`] or a
/// returning [`LockIface::lock`] excludes every other successful acquisition
/// until the matching unlock, with acquire/release ordering between them.
pub unsafe trait LockIface {
    fn lock(&self);

    fn try_lock(&self) -> bool;

    fn is_locked(&self) -> bool;

    fn unlock(&self);

    fn try_unlock(&self) -> bool;
}

unsafe impl<L: LockIface + ?Sized> LockIface for &L {
    #[inline]
    fn lock(&self) {
        (**self).lock()
    }

    #[inline]
    fn try_lock(&self) -> bool {
        (**self).try_lock()
    }

    #[inline]
    fn is_locked(&self) -> bool {
        (**self).is_locked()
    }

    #[inline]
    fn unlock(&self) {
        (**self).unlock()
    }

    #[inline]
    fn try_unlock(&self) -> bool {
        (**self).try_unlock()
    }
}

///
/// Reader-writer side of a spinning lock.
///
/// Any number of readers, or a single writer, hold the lock at a time. Both
/// release operations fail rather than corrupt the state when the lock is
/// not held in that mode.
///
/// # Safety
/// A successful [`RwLockIface::try_lock_write`] must exclude every reader and
/// every other writer until the matching release, and a successful
/// [`RwLockIface::try_lock_read`] must exclude every writer, with
/// acquire/release ordering between them.
pub unsafe trait RwLockIface {
    fn try_lock_read(&self) -> bool;

    fn try_release_read(&self) -> bool;

    fn try_lock_write(&self) -> bool;

    fn try_release_write(&self) -> bool;
}
