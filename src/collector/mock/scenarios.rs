//! Pre-built mock hosts for testing.
//!
//! These scenarios provide realistic `/proc`, `/sys` and command states for
//! the kinds of machines the collector runs on.

use super::commands::MockCommands;
use super::filesystem::MockFs;
use crate::collector::host::HostContext;

/// A fully scripted host: filesystem, commands, environment and runtime
/// facts.
#[derive(Debug, Clone)]
pub struct MockHost {
    pub fs: MockFs,
    pub commands: MockCommands,
    pub env: Vec<(String, String)>,
    pub os: String,
    pub arch: String,
    pub parallelism: Option<usize>,
}

impl MockHost {
    /// Linux host with nothing readable and no commands installed.
    pub fn bare() -> Self {
        Self {
            fs: MockFs::new(),
            commands: MockCommands::new(),
            env: Vec::new(),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            parallelism: None,
        }
    }

    /// Builds a [`HostContext`] over a snapshot of this host.
    pub fn context(&self) -> HostContext {
        HostContext::new(self.fs.clone(), self.commands.clone())
            .with_env(self.env.clone())
            .with_os(self.os.clone())
            .with_arch(self.arch.clone())
            .with_parallelism(self.parallelism)
    }

    pub fn set_env(&mut self, key: &str, value: &str) {
        self.env.retain(|(k, _)| k != key);
        self.env.push((key.to_string(), value.to_string()));
    }

    /// GitHub-hosted Ubuntu runner: 4 vCPUs, 16 GB, Azure VM.
    ///
    /// `free -b` reports a slightly different free figure than
    /// `/proc/meminfo`, which shows up as a conflict.
    pub fn typical_linux() -> Self {
        let mut host = Self::bare();
        host.parallelism = Some(4);
        for (k, v) in [
            ("CI", "true"),
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_WORKFLOW", "Hardware Info"),
            ("GITHUB_RUN_ID", "8812345678"),
            ("RUNNER_OS", "Linux"),
        ] {
            host.set_env(k, v);
        }

        let fs = &mut host.fs;

        // Identity
        fs.add_file(
            "/etc/os-release",
            "\
PRETTY_NAME=\"Ubuntu 22.04.4 LTS\"
NAME=\"Ubuntu\"
VERSION_ID=\"22.04\"
VERSION=\"22.04.4 LTS (Jammy Jellyfish)\"
ID=ubuntu
ID_LIKE=debian
",
        );
        fs.add_file("/proc/sys/kernel/hostname", "fv-az1234-567\n");
        fs.add_file("/proc/sys/kernel/osrelease", "6.5.0-1025-azure\n");
        fs.add_file("/proc/uptime", "350735.47 1302219.61\n");
        fs.add_file("/sys/class/dmi/id/sys_vendor", "Microsoft Corporation\n");
        fs.add_file("/sys/class/dmi/id/product_name", "Virtual Machine\n");
        fs.add_file("/proc/1/cgroup", "0::/init.scope\n");

        // CPU
        let mut cpuinfo = String::new();
        for (processor, core) in [(0, 0), (1, 0), (2, 1), (3, 1)] {
            cpuinfo.push_str(&format!(
                "\
processor\t: {processor}
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) Platinum 8370C CPU @ 2.80GHz
cpu MHz\t\t: 2793.437
cache size\t: 49152 KB
physical id\t: 0
core id\t\t: {core}

"
            ));
        }
        fs.add_file("/proc/cpuinfo", cpuinfo);
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 100 200 0 0 0
cpu0 2500 125 750 20000 250 25 50 0 0 0
cpu1 2500 125 750 20000 250 25 50 0 0 0
cpu2 2500 125 750 20000 250 25 50 0 0 0
cpu3 2500 125 750 20000 250 25 50 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs.add_file("/proc/loadavg", "0.15 0.10 0.05 1/150 1234\n");

        // Memory
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
",
        );
        fs.add_file(
            "/proc/self/cgroup",
            "0::/user.slice/user-1001.slice/session-1.scope\n",
        );
        fs.add_file(
            "/sys/fs/cgroup/user.slice/user-1001.slice/session-1.scope/memory.max",
            "max\n",
        );
        fs.add_file(
            "/sys/fs/cgroup/user.slice/user-1001.slice/session-1.scope/memory.current",
            "1073741824\n",
        );

        // Disks
        fs.add_file(
            "/proc/diskstats",
            "\
   7       0 loop0 52 0 2096 8 0 0 0 0 0 16 8 0 0 0 0
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0
   8      16 sdb 2000 10 64000 900 1000 5 32000 700 0 800 1600 0 0 0 0
   8      17 sdb1 1900 10 60000 850 990 5 31000 690 0 780 1540 0 0 0 0
",
        );

        // Network
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678    9876    0    0    0     0          0         0 12345678    9876    0    0    0     0       0          0
  eth0: 987654321  654321    5   10    0     0          0         0 123456789  98765    2    5    0     0       0          0
docker0:       0       0    0    0    0     0          0         0        0       0    0    0    0     0       0          0
",
        );
        fs.add_dir("/sys/class/net/docker0");
        fs.add_dir("/sys/class/net/eth0");
        fs.add_dir("/sys/class/net/lo");

        // Security
        fs.add_file(
            "/proc/self/status",
            "\
Name:\thwfacts
State:\tR (running)
Uid:\t1001\t1001\t1001\t1001
Gid:\t118\t118\t118\t118
CapEff:\t0000000000000000
NoNewPrivs:\t0
Seccomp:\t0
",
        );
        fs.add_file("/proc/sys/kernel/randomize_va_space", "2\n");
        fs.add_file(
            "/sys/kernel/security/lsm",
            "lockdown,capability,landlock,yama,apparmor",
        );

        let commands = &mut host.commands;
        commands.add("uname -snrm", "Linux fv-az1234-567 6.5.0-1025-azure x86_64\n");
        commands.add(
            "lscpu",
            "\
Architecture:                       x86_64
  CPU op-mode(s):                   32-bit, 64-bit
CPU(s):                             4
Vendor ID:                          GenuineIntel
  Model name:                       Intel(R) Xeon(R) Platinum 8370C CPU @ 2.80GHz
    Thread(s) per core:             2
    Core(s) per socket:             2
    Socket(s):                      1
Hypervisor vendor:                  Microsoft
",
        );
        commands.add(
            "free -b",
            "\
               total        used        free      shared  buff/cache   available
Mem:     16777216000  4489216000  8388000000     5242880  3900000000 12288000000
Swap:     4194304000           0  4194304000
",
        );
        commands.add(
            "df -Pk /",
            "\
Filesystem     1024-blocks     Used Available Capacity Mounted on
/dev/root         76026616 52881000  23129232      70% /
",
        );
        commands.add(
            "lsblk -b -d -n -o NAME,SIZE,TYPE,ROTA",
            "\
loop0     67108864 loop    0
sda    80530636800 disk    0
sdb    80530636800 disk    0
",
        );
        commands.add(
            "ip -o addr show",
            "\
1: lo    inet 127.0.0.1/8 scope host lo\\       valid_lft forever preferred_lft forever
1: lo    inet6 ::1/128 scope host \\       valid_lft forever preferred_lft forever
2: eth0    inet 10.1.0.4/16 brd 10.1.255.255 scope global eth0\\       valid_lft forever preferred_lft forever
2: eth0    inet6 fe80::20d:3aff:fe5c:1/64 scope link \\       valid_lft forever preferred_lft forever
3: docker0    inet 172.17.0.1/16 brd 172.17.255.255 scope global docker0\\       valid_lft forever preferred_lft forever
",
        );
        commands.add("hostname -I", "10.1.0.4 172.17.0.1 \n");
        commands.add("id -u", "1001\n");
        commands.add("sudo -n true", "");
        commands.add("sudo -n dmidecode -s system-product-name", "Virtual Machine\n");

        host
    }

    /// Docker container on a 64 GB host with a 2 GiB memory limit, running
    /// as root with a minimal userland.
    pub fn container() -> Self {
        let mut host = Self::bare();
        host.parallelism = Some(2);
        host.set_env("HOSTNAME", "3f4e2a1b9c0d");

        let fs = &mut host.fs;
        fs.add_file("/.dockerenv", "");
        fs.add_file(
            "/etc/os-release",
            "\
PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"
NAME=\"Debian GNU/Linux\"
VERSION_ID=\"12\"
ID=debian
",
        );
        fs.add_file("/proc/sys/kernel/hostname", "3f4e2a1b9c0d\n");
        fs.add_file("/proc/sys/kernel/osrelease", "6.8.0-45-generic\n");
        fs.add_file("/proc/uptime", "9120.05 17002.11\n");
        fs.add_file("/proc/1/cgroup", "0::/\n");
        fs.add_file("/proc/self/cgroup", "0::/\n");
        fs.add_file("/sys/fs/cgroup/memory.max", "2147483648\n");
        fs.add_file("/sys/fs/cgroup/memory.current", "536870912\n");

        fs.add_file(
            "/proc/cpuinfo",
            "\
processor\t: 0
vendor_id\t: AuthenticAMD
model name\t: AMD EPYC 7763 64-Core Processor
cpu MHz\t\t: 2445.406

processor\t: 1
vendor_id\t: AuthenticAMD
model name\t: AMD EPYC 7763 64-Core Processor
cpu MHz\t\t: 2445.406
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  40000 0 10000 150000 0 0 0 0 0 0
cpu0 20000 0 5000 75000 0 0 0 0 0 0
cpu1 20000 0 5000 75000 0 0 0 0 0 0
ctxt 90000
btime 1700090000
processes 120
",
        );
        fs.add_file("/proc/loadavg", "4.50 3.20 2.10 8/320 5678\n");
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       65536000 kB
MemFree:        30000000 kB
MemAvailable:   49152000 kB
SwapTotal:             0 kB
SwapFree:              0 kB
",
        );
        fs.add_file(
            "/proc/diskstats",
            "\
 252       0 vda 80000 0 3200000 4000 40000 0 1600000 9000 0 7000 13000 0 0 0 0
 252       1 vda1 79000 0 3100000 3900 39000 0 1500000 8900 0 6900 12800 0 0 0 0
",
        );
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:     800      10    0    0    0     0          0         0      800      10    0    0    0     0       0          0
  eth0: 5242880    4000    0    0    0     0          0         0   104857     900    0    0    0     0       0          0
",
        );
        fs.add_dir("/sys/class/net/eth0");
        fs.add_dir("/sys/class/net/lo");
        fs.add_file(
            "/proc/self/status",
            "\
Name:\thwfacts
Uid:\t0\t0\t0\t0
Gid:\t0\t0\t0\t0
CapEff:\t00000000a80425fb
NoNewPrivs:\t0
Seccomp:\t2
",
        );
        fs.add_file("/proc/sys/kernel/randomize_va_space", "2\n");

        let commands = &mut host.commands;
        commands.add("uname -snrm", "Linux 3f4e2a1b9c0d 6.8.0-45-generic x86_64\n");
        commands.add(
            "df -Pk /",
            "\
Filesystem     1024-blocks     Used Available Capacity Mounted on
overlay          101445540 31554004  69874880      32% /
",
        );
        commands.add("id -u", "0\n");
        commands.add("hostname -I", "172.17.0.2 \n");

        host
    }
}
