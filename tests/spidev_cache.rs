// tests/spidev_cache.rs
//! Integration tests for the spidev handle cache

mod common;

use hwio_core::config::constants::spi::MAX_DEVICES;
use hwio_core::hal::simulator::MemoryDeviceOpener;
use hwio_core::hal::{DeviceAddress, SpiDeviceCache, SpiMode};
use hwio_core::shutdown::{RecordingShutdown, ShutdownExt};
use hwio_core::ErrorKind;
use proptest::prelude::*;
use std::path::PathBuf;

#[test]
fn test_open_reuse_and_second_device() {
    common::init_tracing();
    let opener = MemoryDeviceOpener::new();
    let mut cache = SpiDeviceCache::new(opener.clone());

    let first = cache.get_or_open(0, 1).unwrap();
    assert_eq!(opener.opened(), vec![PathBuf::from("/dev/spidev0.1")]);

    let again = cache.get_or_open(0, 1).unwrap();
    assert_eq!(again, first);
    assert_eq!(opener.open_count(), 1);

    let second = cache.get_or_open(0, 2).unwrap();
    assert_ne!(second, first);
    assert_eq!(
        opener.opened(),
        vec![PathBuf::from("/dev/spidev0.1"), PathBuf::from("/dev/spidev0.2")]
    );
}

#[test]
fn test_setup_with_same_bus_id_is_side_effect_free() {
    let opener = MemoryDeviceOpener::new();
    let mut cache = SpiDeviceCache::new(opener.clone());

    let a = cache.setup(0x0102, SpiMode::Mode0, 500_000).unwrap();
    // Mode and rate are not part of the key
    let b = cache.setup(0x0102, SpiMode::Mode3, 8_000_000).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.address(), DeviceAddress::new(1, 2));
    assert_eq!(opener.open_count(), 1);
}

#[test]
fn test_seventeenth_device_is_rejected() {
    common::init_tracing();
    let opener = MemoryDeviceOpener::new();
    let mut cache = SpiDeviceCache::new(opener.clone());
    let handles: Vec<_> = (0..MAX_DEVICES as u8)
        .map(|device| cache.get_or_open(0, device).unwrap())
        .collect();

    let err = cache.get_or_open(1, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.shutdown_reason(), "Too many spi devices");
    assert_eq!(cache.len(), MAX_DEVICES);

    for (device, handle) in handles.into_iter().enumerate() {
        cache.transfer(handle, &[device as u8]).unwrap();
        let path = format!("/dev/spidev0.{}", device);
        assert_eq!(opener.written(&path), vec![device as u8]);
    }
}

#[test]
fn test_errors_route_to_shutdown() {
    common::init_tracing();
    let opener = MemoryDeviceOpener::new();
    opener.remove_device("/dev/spidev2.0");
    let mut cache = SpiDeviceCache::new(opener.clone());
    let shutdown = RecordingShutdown::new();

    assert!(cache.get_or_open(2, 0).or_shutdown(&shutdown).is_none());

    let handle = cache.get_or_open(0, 0).or_shutdown(&shutdown).unwrap();
    opener.fail_writes(true);
    assert!(cache.transfer(handle, &[0xaa]).or_shutdown(&shutdown).is_none());

    assert_eq!(
        shutdown.reasons(),
        vec!["Unable to open spi device", "Unable to write to spi"]
    );
}

#[cfg(unix)]
mod linux {
    use super::*;
    use hwio_core::hal::LinuxDeviceOpener;
    use std::fs;

    #[test]
    fn test_linux_opener_writes_to_device_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/spidev", dir.path().display());
        fs::write(format!("{}3.1", prefix), b"").unwrap();

        let mut cache = SpiDeviceCache::with_prefix(LinuxDeviceOpener, &prefix);
        let handle = cache.setup(0x0301, SpiMode::Mode0, 1_000_000).unwrap();
        assert_eq!(cache.transfer(handle, b"hello").unwrap(), 5);

        assert_eq!(fs::read(format!("{}3.1", prefix)).unwrap(), b"hello");
    }

    #[test]
    fn test_linux_opener_sets_fd_flags() {
        use hwio_core::hal::DeviceOpener;
        use std::os::unix::io::AsRawFd;

        let file = tempfile::NamedTempFile::new().unwrap();
        let mut opener = LinuxDeviceOpener;
        let stream = opener.open(file.path()).unwrap();
        let fd = stream.as_raw_fd();

        let status = |fd| unsafe { libc::fcntl(fd, libc::F_GETFL) };
        assert_eq!(status(fd) & libc::O_ACCMODE, libc::O_RDWR);
        assert_eq!(status(fd) & libc::O_NONBLOCK, 0);
        let fd_flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        assert_ne!(fd_flags & libc::FD_CLOEXEC, 0);

        opener.set_non_blocking(&stream).unwrap();
        assert_ne!(status(fd) & libc::O_NONBLOCK, 0);
        // Access mode survives the flag update
        assert_eq!(status(fd) & libc::O_ACCMODE, libc::O_RDWR);
    }

    #[test]
    fn test_linux_opener_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/spidev", dir.path().display());
        let mut cache = SpiDeviceCache::with_prefix(LinuxDeviceOpener, &prefix);

        let err = cache.get_or_open(0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
        assert!(cache.is_empty());
    }
}

proptest! {
    #[test]
    fn prop_repeated_lookups_never_reopen(
        addresses in proptest::collection::vec((0u8..4, 0u8..4), 1..64)
    ) {
        let opener = MemoryDeviceOpener::new();
        let mut cache = SpiDeviceCache::new(opener.clone());
        let mut distinct = Vec::new();

        for (bus, device) in addresses {
            let handle = cache.get_or_open(bus, device).unwrap();
            prop_assert_eq!(handle.address(), DeviceAddress::new(bus, device));
            if !distinct.contains(&(bus, device)) {
                distinct.push((bus, device));
            }
        }
        prop_assert_eq!(opener.open_count(), distinct.len());
        prop_assert_eq!(cache.len(), distinct.len());
    }

    #[test]
    fn prop_encoded_address_round_trip(bus in any::<u8>(), device in any::<u8>(), high in any::<u16>()) {
        let encoded = (u32::from(high) << 16) | DeviceAddress::new(bus, device).encode();
        prop_assert_eq!(DeviceAddress::from_encoded(encoded), DeviceAddress::new(bus, device));
    }
}
