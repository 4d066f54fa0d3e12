use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) type Shared<T> = RwLock<T>;

pub(crate) fn shared<T>(t: T) -> Shared<T> {
    RwLock::new(t)
}

// A panic while holding the lock leaves plain data behind, keep using it
pub(crate) fn read<T>(shared: &Shared<T>) -> RwLockReadGuard<'_, T> {
    shared.read().unwrap_or_else(|poisoned| {
        warn!("Recovered poisoned lock");
        poisoned.into_inner()
    })
}

pub(crate) fn write<T>(shared: &Shared<T>) -> RwLockWriteGuard<'_, T> {
    shared.write().unwrap_or_else(|poisoned| {
        warn!("Recovered poisoned lock");
        poisoned.into_inner()
    })
}

macro_rules! acquire {
    ($shared: expr, read) => {
        $crate::sync::read(&$shared)
    };
    ($shared: expr, write) => {
        $crate::sync::write(&$shared)
    };
}

pub(crate) use acquire;

#[cfg(test)]
mod test {
    use super::{acquire, shared};

    #[test]
    fn test_poisoned() {
        let lock = std::sync::Arc::new(shared(1));
        let cloned = lock.clone();
        let result = std::thread::spawn(move || {
            let mut guard = acquire!(cloned, write);
            *guard = 2;
            panic!("poison");
        })
        .join();
        assert!(result.is_err());
        assert!(lock.is_poisoned());
        assert_eq!(*acquire!(lock, read), 2);
        *acquire!(lock, write) = 3;
        assert_eq!(*acquire!(lock, read), 3);
    }
}
