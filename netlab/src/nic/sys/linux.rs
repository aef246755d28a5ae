// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
use super::{ifreq, Errno, LibcResult, IoctlResult};
use libc;

/// Adds a method to open a tap.
///
/// This is an extension trait implemented for `ifreq` in Linux.
pub(crate) trait TunSetIf {
    /// Attach to an existing interface or create a new one.
    fn tun_set_if(&mut self, fd: libc::c_int, kind: libc::c_short) -> Result<(), Errno>;

    /// Convenience method over`set_if` when `kind` is a tap without packet information.
    fn tun_set_tap(&mut self, fd: libc::c_int) -> Result<(), Errno>;
}

/// Adds a method to interact with the mtu.
pub(crate) trait NetdeviceMtu {
    fn get_mtu(&mut self, fd: libc::c_int) -> Result<libc::c_int, Errno>;
}

impl ifreq {
    pub(crate) const SIOCGIFMTU:   libc::Ioctl = 0x8921;

    pub(crate) const TUNSETIFF:    libc::Ioctl = 0x400454CA;
    pub(crate) const IFF_TAP:      libc::c_short = 0x0002;
    pub(crate) const IFF_NO_PI:    libc::c_short = 0x1000;
}

impl TunSetIf for ifreq {
    fn tun_set_if(&mut self, fd: libc::c_int, kind: libc::c_short) -> Result<(), Errno> {
        // The kernel reads a full `struct ifreq`, pad the union to its size.
        #[repr(C)]
        #[derive(Debug)]
        struct Request {
            interface: ifreq,
            ifr_flags: libc::c_short,
            _pad: [u8; 22],
        }

        let mut request = Request {
            interface: *self,
            ifr_flags: kind,
            _pad: [0; 22],
        };

        let res = unsafe {
            libc::ioctl(fd, Self::TUNSETIFF, &mut request as *mut _)
        };

        IoctlResult(res).errno()?;

        Ok(())
    }

    fn tun_set_tap(&mut self, fd: libc::c_int) -> Result<(), Errno> {
        self.tun_set_if(fd, Self::IFF_TAP | Self::IFF_NO_PI)
    }
}

impl NetdeviceMtu for ifreq {
    fn get_mtu(&mut self, fd: libc::c_int) -> Result<libc::c_int, Errno> {
        #[repr(C)]
        struct Request {
            interface: ifreq,
            ifr_mtu: libc::c_int,
            _pad: [u8; 20],
        }

        let mut request = Request {
            interface: *self,
            ifr_mtu: 0,
            _pad: [0; 20],
        };

        let res = unsafe {
            libc::ioctl(fd, Self::SIOCGIFMTU, &mut request as *mut _)
        };

        IoctlResult(res).errno()?;

        Ok(request.ifr_mtu)
    }
}
