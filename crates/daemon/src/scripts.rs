//! Generated helper scripts, rendered once at startup with the mount
//! point baked in and exposed as read-only executables at the root.

use crate::fuse::classify::{STATISTICS_FILE, SYNC_TRIGGER_FILE, UPLOAD_LIST_FILE};

/// `sync_ipod.sh`: creates the sync trigger file; with `-watch`, polls the
/// statistics file and reports upload progress until the sync finishes.
pub fn sync_script(fuse_mount: &str) -> String {
    let stats = format!("{fuse_mount}/{STATISTICS_FILE}");
    let queue = format!("{fuse_mount}/{UPLOAD_LIST_FILE}");
    let trigger = format!("{fuse_mount}/{SYNC_TRIGGER_FILE}");
    format!(
        "#!/bin/sh\n\
         # podfuse sync script\n\
         echo Syncing player...\n\
         if [ \"$1\" = '-watch' ]; then\n\
         \x20   stats='{stats}'\n\
         \x20   initial=$(grep 'Track Count' \"$stats\" | cut -b 14-)\n\
         \x20   count=$(grep -c '^.*$' '{queue}')\n\
         \x20   touch {trigger} >/dev/null 2>&1 &\n\
         \x20   sleep 0.2\n\
         \x20   while [ 1 ]; do\n\
         \x20       current=$(grep 'Track Count' \"$stats\" | cut -b 14-)\n\
         \x20       file=$(grep 'Currently Syncing' \"$stats\")\n\
         \x20       if [ $? != 0 ]; then break; fi\n\
         \x20       clear && echo $file && echo Track $[$current-$initial] of \"$count\" && sleep 0.2\n\
         \x20   done\n\
         elif [ $# = 0 ]; then touch {trigger} >/dev/null 2>&1\n\
         else echo USAGE: $0 '[ -watch ]'\n\
         fi\n\
         echo Finished syncing player\n"
    )
}

/// `add_files.sh`: recursively queues media files onto the upload list.
pub fn add_files_script(fuse_mount: &str) -> String {
    let queue = format!("{fuse_mount}/{UPLOAD_LIST_FILE}");
    format!(
        "#!/bin/sh\n\
         # podfuse recursive add\n\
         if [ $# = 0 ]; then echo \"USAGE: $0 [ file or directory ] ...\"; exit 1; fi\n\
         for file in \"$@\"; do\n\
         \x20   echo $file | grep ^/ &> /dev/null\n\
         \x20   if [ $? != 0 ]; then file=$PWD/$file; fi\n\
         \x20   find \"$file\" | egrep -i '(wav|mp3|m4a)$' >> '{queue}'\n\
         done\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_script_targets_trigger() {
        let script = sync_script("/mnt/player");
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("touch /mnt/player/sync-ipod-now >/dev/null 2>&1"));
        assert!(script.contains("/mnt/player/statistics"));
    }

    #[test]
    fn test_add_files_script_appends_to_queue() {
        let script = add_files_script("/mnt/player");
        assert!(script.contains(">> '/mnt/player/add_songs'"));
        assert!(script.contains("find \"$file\""));
    }
}
